//! Versioned JSON encoding of [`GameSnapshot`] values.

use serde_json::Value;
use thiserror::Error;
use training_defence_core::{snapshot::is_supported_version, GameSnapshot};

/// Failures raised while encoding or decoding snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The payload is not JSON at all.
    #[error("snapshot is not valid json: {0}")]
    Malformed(#[source] serde_json::Error),
    /// The payload lacks an integer `version` field.
    #[error("snapshot carries no version tag")]
    MissingVersion,
    /// The payload was written by an unknown schema version.
    #[error("snapshot version {0} is not supported")]
    UnsupportedVersion(u64),
    /// The payload has a known version but its fields do not match it.
    #[error("snapshot fields are invalid: {0}")]
    Invalid(#[source] serde_json::Error),
    /// Serialisation failed.
    #[error("snapshot could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Encodes a snapshot into compact JSON for slot storage.
pub fn encode_snapshot(snapshot: &GameSnapshot) -> Result<String, SnapshotError> {
    serde_json::to_string(snapshot).map_err(SnapshotError::Encode)
}

/// Encodes a snapshot into indented JSON for export files.
pub fn encode_snapshot_pretty(snapshot: &GameSnapshot) -> Result<String, SnapshotError> {
    serde_json::to_string_pretty(snapshot).map_err(SnapshotError::Encode)
}

/// Decodes a snapshot, checking its version tag before any field.
///
/// Fields introduced after the payload's version fall back to their defaults.
pub fn decode_snapshot(text: &str) -> Result<GameSnapshot, SnapshotError> {
    let value: Value = serde_json::from_str(text).map_err(SnapshotError::Malformed)?;
    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .ok_or(SnapshotError::MissingVersion)?;
    let supported = u32::try_from(version).is_ok_and(is_supported_version);
    if !supported {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    serde_json::from_value(value).map_err(SnapshotError::Invalid)
}
