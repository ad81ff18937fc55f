//! Cleanup of scraped payloads before they are handed to a summarizer.
//!
//! Everything here is a pure function over [`serde_json::Value`]: the input is
//! never mutated and the output is a fresh deep copy.

use serde_json::{Map, Value};

/// Key fragments that mark a field as a link.
const LINK_KEY_MARKERS: [&str; 3] = ["link", "url", "href"];

/// String fragments that mark a value as a link.
const LINK_VALUE_MARKERS: [&str; 3] = ["http", "www.", "://"];

/// Profile fields that carry no signal for a summary.
const LINKEDIN_NOISE_KEYS: [&str; 15] = [
    "id",
    "description_html",
    "input",
    "timestamp",
    "default_avatar",
    "similar_profiles",
    "current_company_name",
    "memorialized_account",
    "current_company_company_id",
    "connections",
    "people_also_viewed",
    "recommendations_count",
    "bio_links",
    "location",
    "educations_details",
];

/// Raw page dumps that the website dataset returns alongside the markdown.
const WEBSITE_NOISE_KEYS: [&str; 2] = ["page_html", "ld_json"];

fn is_link_key(key: &str) -> bool {
    let key = key.to_lowercase();
    LINK_KEY_MARKERS.iter().any(|marker| key.contains(marker))
}

fn is_link_value(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            let s = s.to_lowercase();
            LINK_VALUE_MARKERS.iter().any(|marker| s.contains(marker))
        }
        _ => false,
    }
}

/// Drop every object entry whose key looks like a link (`link`, `url`, `href`)
/// or whose value is a string that looks like one (`http`, `www.`, `://`).
///
/// Array elements are recursed into but never dropped here.
pub fn remove_links(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(remove_links).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, value)| !is_link_key(key) && !is_link_value(value))
                .map(|(key, value)| (key.clone(), remove_links(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Drop every object entry whose key is exactly one of `keys`, at any depth.
pub fn remove_keys(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|v| remove_keys(v, keys)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !keys.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), remove_keys(value, keys)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Null, `""` and the `"-"` placeholder the provider uses for missing fields.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty() || s == "-",
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Falsy array elements are dropped too, so `false` and `0` disappear from lists.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        other => is_empty(other),
    }
}

/// Drop empty values: null, `""`, `"-"`, and arrays that end up empty after filtering.
///
/// Empty objects are kept; an object that lost every field still marks that the section existed.
pub fn remove_empty(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(remove_empty)
                .filter(|v| !is_falsy(v))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), remove_empty(value)))
                .filter(|(_, value)| !is_empty(value))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Links, then named keys, then empty values.
pub fn sanitize(value: &Value, keys: &[&str]) -> Value {
    remove_empty(&remove_keys(&remove_links(value), keys))
}

/// Prepare a scraped LinkedIn profile for summarization.
///
/// On top of [`sanitize`], activity entries are reduced to `{title, interaction}` and
/// education entries without a title are dropped.
pub fn prepare_linkedin_profile(data: &Value) -> Value {
    let mut profile = data.clone();

    if let Value::Object(fields) = &mut profile {
        if let Some(Value::Array(activity)) = fields.get("activity") {
            let reshaped = activity.iter().map(reshape_activity).collect();
            fields.insert("activity".to_string(), Value::Array(reshaped));
        }

        // Untitled entries become null and fall out in the empty-value pass
        if let Some(Value::Array(education)) = fields.get("education") {
            let kept = education
                .iter()
                .map(|entry| {
                    if non_empty_str(entry, "title").is_some() {
                        entry.clone()
                    } else {
                        Value::Null
                    }
                })
                .collect();
            fields.insert("education".to_string(), Value::Array(kept));
        }
    }

    sanitize(&profile, &LINKEDIN_NOISE_KEYS)
}

/// Prepare a scraped website payload for summarization.
pub fn prepare_website(data: &Value) -> Value {
    remove_empty(&remove_keys(data, &WEBSITE_NOISE_KEYS))
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// "Liked by Jane Doe" becomes "liked".
fn reshape_activity(entry: &Value) -> Value {
    let (Some(title), Some(interaction)) = (
        non_empty_str(entry, "title"),
        non_empty_str(entry, "interaction"),
    ) else {
        return Value::Null;
    };

    let interaction = interaction
        .split(" by ")
        .next()
        .unwrap_or(interaction)
        .to_lowercase();

    let mut reshaped = Map::new();
    reshaped.insert("title".to_string(), Value::String(title.to_string()));
    reshaped.insert("interaction".to_string(), Value::String(interaction));
    Value::Object(reshaped)
}
