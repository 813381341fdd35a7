// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! JSON modules: parsed data exposed as a single `default` export.

use crate::error::{HostError, Result};
use quarry_engine::{ModuleId, ModuleName, Realm, Value};

/// Builds synthetic modules from JSON documents.
pub struct JsonSynthesizer;

impl JsonSynthesizer {
    /// Parses `bytes` and creates an unregistered module exporting the
    /// document as `default`. Nothing is created if parsing fails.
    pub fn synthesize(realm: &mut Realm, name: &ModuleName, bytes: &[u8]) -> Result<ModuleId> {
        let document: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|source| HostError::Parse {
                name: name.clone(),
                source,
            })?;
        let exports = vec![("default".to_string(), Value::from_json(&document))];
        let id = realm.synthetic_module(name, exports);
        tracing::debug!(module = %name, "synthesized JSON module");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_engine::{JobStatus, PromiseState};

    #[test]
    fn test_default_export_only() {
        let mut realm = Realm::new();
        let name = ModuleName::from("json:/data/config.json");
        let bytes = br#"{"debug": true, "level": 3}"#;
        let id = JsonSynthesizer::synthesize(&mut realm, &name, bytes).unwrap();
        let promise = realm.evaluate(id).unwrap();
        while let JobStatus::Ran = realm.execute_pending_job() {}
        assert!(matches!(promise.state(), PromiseState::Fulfilled(_)));

        let ns = realm.namespace(id).unwrap();
        assert_eq!(ns.keys(), ["default"]);
        assert_eq!(ns.get("default").get("level").unwrap(), Value::Number(3.0));
    }

    #[test]
    fn test_malformed_json_creates_nothing() {
        let mut realm = Realm::new();
        let name = ModuleName::from("json:/data/broken.json");
        let err = JsonSynthesizer::synthesize(&mut realm, &name, b"{\"a\": ").unwrap_err();
        assert!(matches!(err, HostError::Parse { .. }));
        assert_eq!(realm.module_count(), 0);
    }
}
