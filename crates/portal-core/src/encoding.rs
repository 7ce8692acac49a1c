//! Encoders for the remote API's option string and custom metadata blob.

use crate::models::{CustomMetadata, TaskOptions};

/// Join non-empty options as `key=value`, comma separated, in caller order.
pub fn encode_options(options: &TaskOptions) -> String {
    options
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
}

/// Serialize custom metadata as compact JSON.
pub fn encode_custom(custom: &CustomMetadata) -> Result<String, serde_json::Error> {
    serde_json::to_string(custom)
}

/// Inverse of [`encode_custom`].
pub fn decode_custom(raw: &str) -> Result<CustomMetadata, serde_json::Error> {
    serde_json::from_str(raw)
}
