pub mod ai_agent;
pub mod email;
pub mod telegram;

use common::error::NodeExecutorError;
use common::types::{Credential, JsonValue};
use std::collections::HashMap;

/// Fetch and deserialize the `data` blob of the credential registered under
/// `platform`, failing with [`NodeExecutorError::MissingCredential`] if the
/// job carries no credential for that platform.
pub(crate) fn credential_data<'a>(
    credentials: &'a HashMap<String, Credential>,
    platform: &str,
) -> Result<&'a JsonValue, NodeExecutorError> {
    credentials
        .get(platform)
        .map(|c| &c.data)
        .ok_or_else(|| NodeExecutorError::MissingCredential(platform.to_string()))
}

pub(crate) fn require_str<'a>(
    value: &'a JsonValue,
    field: &str,
    node_type: &str,
) -> Result<&'a str, NodeExecutorError> {
    value
        .get(field)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            NodeExecutorError::HandlerFailed(
                node_type.to_string(),
                format!("missing or non-string field `{field}`"),
            )
        })
}
