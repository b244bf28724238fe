//! # Content Fingerprints
//!
//! SHA-256 over a canonical JSON encoding: object keys sorted at every level,
//! no insignificant whitespace. Two values that serialize to the same logical
//! JSON always produce the same fingerprint, whatever order their fields were
//! built in.

use super::InstallError;
use crate::constants::LAST_APPLIED_HASH_KEY;
use crate::manifest::Resource;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the canonical JSON form of `value`
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Fingerprint of a whole resource, ignoring its own hash annotation
pub fn fingerprint_resource(resource: &Resource) -> Result<String, InstallError> {
    let mut content = resource.clone();
    content.remove_annotation(LAST_APPLIED_HASH_KEY);
    fingerprint(&content).map_err(|source| InstallError::MalformedPayload {
        resource: resource.key().to_string(),
        source,
    })
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::from(key.as_str()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
