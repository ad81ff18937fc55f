//! API key issuance and hashing.
//!
//! Keys look like `sk-<64 hex chars>`. Only the SHA-256 hash of a key is stored;
//! the plaintext is returned to the caller once and then forgotten.

use sha2::{Digest, Sha256};

use crate::{
    error::AppError,
    models::api_key::{CreateApiKeyRequest, CreateApiKeyResponse, NewApiKey},
    store::Store,
};

const KEY_PREFIX: &str = "sk-";

const DEFAULT_CREATOR: &str = "system";

const MAX_CREATOR_LEN: usize = 255;

/// SHA-256 of the key, hex encoded (64 chars).
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new plaintext key from 32 random bytes.
fn generate_api_key() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

/// Issue a new API key.
///
/// # Process
///
/// 1. Validate creator and usage limit (defaults: "system", `default_usage_limit`)
/// 2. Generate a random secret and hash it
/// 3. Store the hash
/// 4. Return the plaintext secret together with the stored hash
///
/// # Errors
///
/// - `InvalidRequest`: negative limit or creator too long
/// - `Database`: insert failed
pub async fn create_api_key(
    store: &dyn Store,
    request: CreateApiKeyRequest,
    default_usage_limit: i32,
) -> Result<CreateApiKeyResponse, AppError> {
    let creator = request
        .creator
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CREATOR)
        .to_string();

    if creator.len() > MAX_CREATOR_LEN {
        return Err(AppError::InvalidRequest(format!(
            "creator exceeds {MAX_CREATOR_LEN} characters"
        )));
    }

    let usage_limit = request.usage_limit.unwrap_or(default_usage_limit);
    if usage_limit < 0 {
        return Err(AppError::InvalidRequest(
            "usage_limit must not be negative".to_string(),
        ));
    }

    let api_key = generate_api_key();
    let hash = hash_api_key(&api_key);

    let stored = store
        .insert_api_key(NewApiKey {
            hash,
            creator,
            usage_limit,
        })
        .await?;

    tracing::info!(api_key_id = %stored.id, creator = %stored.creator, "API key created");

    Ok(CreateApiKeyResponse {
        id: stored.id,
        api_key,
        hash: stored.hash,
        usage_limit: stored.usage_limit,
        message: "API Key created successfully. Store it securely!".to_string(),
    })
}
