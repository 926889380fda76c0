//! Settings documents as schemaless, ordered JSON objects.
//!
//! A document is never deserialized into a fixed record: keys written by other
//! tools or newer versions have to survive a read-modify-write cycle untouched.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::{Map, Value};

/// Ordered mapping of top-level setting keys to arbitrary JSON values.
pub type SettingsDocument = Map<String, Value>;

/// Legacy name of `steeringMode`.
const LEGACY_QUEUE_MODE_KEY: &str = "queueMode";
const STEERING_MODE_KEY: &str = "steeringMode";

/// Parse the text of a settings file.
///
/// Anything other than a top-level JSON object is rejected.
pub fn parse_document(contents: &str) -> Result<SettingsDocument, String> {
    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(&other)
        )),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Read and parse a settings file.
///
/// `Ok(None)` means the file does not exist; every other failure is reported
/// as a message suitable for a [`LoadError`](crate::LoadError).
pub fn read_document(path: &Path) -> Result<Option<SettingsDocument>, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_document(&contents).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("cannot read {}: {e}", path.display())),
    }
}

/// Async twin of [`read_document`], used on the flush path.
pub async fn read_document_async(path: &Path) -> Result<Option<SettingsDocument>, String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => parse_document(&contents).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(format!("cannot read {}: {e}", path.display())),
    }
}

/// Rewrite legacy keys in place. Returns `true` if anything changed.
///
/// `queueMode` was renamed to `steeringMode`; when both are present the newer
/// key wins and the legacy one is dropped.
pub fn migrate_legacy_keys(doc: &mut SettingsDocument) -> bool {
    let Some(legacy) = doc.shift_remove(LEGACY_QUEUE_MODE_KEY) else {
        return false;
    };
    if !doc.contains_key(STEERING_MODE_KEY) {
        doc.insert(STEERING_MODE_KEY.to_string(), legacy);
    }
    true
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
