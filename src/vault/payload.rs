//! The decrypted vault document.
//!
//! The engine does not look inside `settings` or `accounts`; both are
//! opaque JSON owned by higher layers.  The only structure enforced here
//! is the top-level shape and the schema version, which is resolved once
//! when the vault is opened.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{Result, VaultError};

/// Schema version written by this build.
pub const CURRENT_PAYLOAD_VERSION: u32 = 1;

/// Plaintext content of a vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaintextPayload {
    pub version: u32,
    pub settings: Map<String, Value>,
    pub accounts: Vec<Value>,

    /// Unknown top-level keys, carried through saves untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PlaintextPayload {
    fn default() -> Self {
        Self {
            version: CURRENT_PAYLOAD_VERSION,
            settings: Map::new(),
            accounts: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl PlaintextPayload {
    /// Parse decrypted bytes, migrating older schema versions.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let doc: Value = serde_json::from_slice(bytes)
            .map_err(|e| VaultError::MalformedFile(format!("payload JSON: {e}")))?;
        migrate(doc)
    }

    /// Serialize to compact JSON for sealing.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VaultError::Serialization(format!("payload: {e}")))
    }
}

/// Bring a payload document of any known version up to
/// `CURRENT_PAYLOAD_VERSION`.
///
/// A document without a `version` key is treated as version 0.
pub fn migrate(doc: Value) -> Result<PlaintextPayload> {
    let Value::Object(mut obj) = doc else {
        return Err(VaultError::MalformedFile(
            "payload is not a JSON object".into(),
        ));
    };

    let mut version = match obj.get("version") {
        None => 0,
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                VaultError::MalformedFile("payload version is not an integer".into())
            })?,
    };

    if version > CURRENT_PAYLOAD_VERSION {
        return Err(VaultError::MalformedFile(format!(
            "payload version {version} is newer than supported ({CURRENT_PAYLOAD_VERSION})"
        )));
    }

    // Each step lifts the document by exactly one version.
    if version == 0 {
        migrate_v0_to_v1(&mut obj);
        version = 1;
    }
    debug_assert_eq!(version, CURRENT_PAYLOAD_VERSION);

    serde_json::from_value(Value::Object(obj))
        .map_err(|e| VaultError::MalformedFile(format!("payload: {e}")))
}

/// v0 documents may lack `settings`/`accounts` or hold the wrong type.
fn migrate_v0_to_v1(obj: &mut Map<String, Value>) {
    if !obj.get("settings").is_some_and(Value::is_object) {
        obj.insert("settings".into(), Value::Object(Map::new()));
    }
    if !obj.get("accounts").is_some_and(Value::is_array) {
        obj.insert("accounts".into(), Value::Array(Vec::new()));
    }
    obj.insert("version".into(), Value::from(1u32));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_payload_is_empty_version_1() {
        let bytes = PlaintextPayload::default().to_vec().unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc, json!({"version": 1, "settings": {}, "accounts": []}));
    }

    #[test]
    fn v1_document_parses_as_is() {
        let doc = json!({
            "version": 1,
            "settings": {"default_region": "eu"},
            "accounts": [{"alias": "main", "game": "Valorant"}]
        });
        let payload = migrate(doc).unwrap();
        assert_eq!(payload.settings["default_region"], "eu");
        assert_eq!(payload.accounts.len(), 1);
    }

    #[test]
    fn versionless_document_is_migrated() {
        let doc = json!({"accounts": {"not": "a list"}});
        let payload = migrate(doc).unwrap();
        assert_eq!(payload.version, 1);
        assert!(payload.settings.is_empty());
        assert!(payload.accounts.is_empty());
    }

    #[test]
    fn v0_keeps_well_typed_fields() {
        let doc = json!({"settings": {"a": 1}, "accounts": [{"alias": "x"}]});
        let payload = migrate(doc).unwrap();
        assert_eq!(payload.settings["a"], 1);
        assert_eq!(payload.accounts, vec![json!({"alias": "x"})]);
    }

    #[test]
    fn v1_missing_accounts_is_rejected() {
        let doc = json!({"version": 1, "settings": {}});
        assert!(matches!(migrate(doc), Err(VaultError::MalformedFile(_))));
    }

    #[test]
    fn future_version_is_rejected() {
        let doc = json!({"version": 2, "settings": {}, "accounts": []});
        assert!(matches!(migrate(doc), Err(VaultError::MalformedFile(_))));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(migrate(json!([1, 2, 3])).is_err());
        assert!(PlaintextPayload::from_slice(b"not json").is_err());
    }

    #[test]
    fn unknown_top_level_keys_survive() {
        let doc = json!({"version": 1, "settings": {}, "accounts": [], "theme": "dark"});
        let payload = migrate(doc).unwrap();
        let back: Value = serde_json::from_slice(&payload.to_vec().unwrap()).unwrap();
        assert_eq!(back["theme"], "dark");
    }
}
