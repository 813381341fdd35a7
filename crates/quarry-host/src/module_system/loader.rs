// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Canonical name to module record.

use super::byte_source::ByteSource;
use super::json::JsonSynthesizer;
use super::resolver::ResolverBridge;
use crate::context::BridgeContext;
use crate::error::{HostError, Result};
use quarry_engine::{Exception, ModuleId, ModuleLoader, ModuleName, Realm, Value};
use std::rc::Rc;

/// Reserved prefix marking a module as JSON data.
pub const JSON_PREFIX: &str = "json:";

/// Returns true if `name` denotes a JSON module.
pub fn is_json_module(name: &ModuleName) -> bool {
    name.as_str().as_bytes().starts_with(JSON_PREFIX.as_bytes())
}

/// Produces unregistered module records for canonical names.
///
/// Keeps no per-name state: the realm's module map is the only cache.
pub struct LoaderBridge<'a> {
    context: &'a BridgeContext,
}

impl<'a> LoaderBridge<'a> {
    /// Create a loader over a bridge context
    pub fn new(context: &'a BridgeContext) -> Self {
        Self { context }
    }

    /// Loads `name`: fetch, then synthesize or compile, then initialize.
    pub fn load(&self, realm: &mut Realm, name: &ModuleName) -> Result<ModuleId> {
        let bytes = ByteSource::new(self.context).fetch(name)?;

        if is_json_module(name) {
            return JsonSynthesizer::synthesize(realm, name, &bytes);
        }

        let source = std::str::from_utf8(&bytes).map_err(|err| HostError::invalid_utf8(name, err))?;
        let id = realm
            .compile_module(name, source)
            .map_err(|source| HostError::Compile {
                name: name.clone(),
                source,
            })?;
        drop(bytes);

        if let Err(source) = self.initialize(realm, name, id) {
            tracing::debug!(module = %name, "module initialization failed, releasing record");
            if let Err(err) = realm.release_module(id) {
                tracing::warn!(module = %name, error = %err, "failed to release module record");
            }
            return Err(HostError::Load {
                name: name.clone(),
                source,
            });
        }

        tracing::debug!(module = %name, %id, "compiled module");
        Ok(id)
    }

    fn initialize(
        &self,
        realm: &Realm,
        name: &ModuleName,
        id: ModuleId,
    ) -> std::result::Result<(), Exception> {
        let import_meta = realm.import_meta(id)?;
        import_meta.set("url", Value::string(name.as_str()));
        let namespace = realm.namespace(id)?;
        self.context.policy().init(name, &import_meta, &namespace)
    }
}

/// The resolver and loader bridges installed into a realm.
pub struct ModuleHooks {
    context: Rc<BridgeContext>,
}

impl ModuleHooks {
    /// Create hooks sharing `context`
    pub fn new(context: Rc<BridgeContext>) -> Self {
        Self { context }
    }
}

impl ModuleLoader for ModuleHooks {
    fn resolve(
        &self,
        _realm: &mut Realm,
        base: &ModuleName,
        specifier: &str,
    ) -> std::result::Result<ModuleName, Exception> {
        ResolverBridge::new(&self.context)
            .resolve(base, specifier)
            .map_err(Exception::from)
    }

    fn load(
        &self,
        realm: &mut Realm,
        name: &ModuleName,
    ) -> std::result::Result<ModuleId, Exception> {
        LoaderBridge::new(&self.context)
            .load(realm, name)
            .map_err(Exception::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LoaderPolicy;
    use quarry_engine::JsObject;
    use std::cell::Cell;

    fn context(init_calls: Rc<Cell<usize>>) -> BridgeContext {
        let policy = LoaderPolicy::builder()
            .resolve(|s, _| Ok(ModuleName::from(s)))
            .load(|name| match name.as_str() {
                "json:/data.json" => Ok(r#"{"answer": 42}"#.to_string()),
                "/broken.js" => Ok("export default ;".to_string()),
                _ => Ok("export const meta = import.meta;".to_string()),
            })
            .init(move |name, meta, _ns| {
                init_calls.set(init_calls.get() + 1);
                if name.as_str() == "/rejected.js" {
                    return Err(Exception::error("init refused"));
                }
                meta.set("tagged", Value::Boolean(true));
                Ok(())
            })
            .build()
            .unwrap();
        BridgeContext::new(Vec::new(), JsObject::new(), policy)
    }

    #[test]
    fn test_json_prefix_is_literal() {
        assert!(is_json_module(&ModuleName::from("json:/a.json")));
        assert!(!is_json_module(&ModuleName::from("JSON:/a.json")));
        assert!(!is_json_module(&ModuleName::from("/a.json")));
        assert!(!is_json_module(&ModuleName::from("json")));
    }

    #[test]
    fn test_source_module_gets_url_and_init() {
        let calls = Rc::new(Cell::new(0));
        let ctx = context(calls.clone());
        let mut realm = Realm::new();
        let name = ModuleName::from("/main.js");
        let id = LoaderBridge::new(&ctx).load(&mut realm, &name).unwrap();

        let meta = realm.import_meta(id).unwrap();
        assert_eq!(meta.get("url"), Value::from("/main.js"));
        assert_eq!(meta.get("tagged"), Value::Boolean(true));
        assert_eq!(calls.get(), 1);
        assert!(!realm.has_module("/main.js"));
    }

    #[test]
    fn test_json_module_skips_init() {
        let calls = Rc::new(Cell::new(0));
        let ctx = context(calls.clone());
        let mut realm = Realm::new();
        LoaderBridge::new(&ctx)
            .load(&mut realm, &ModuleName::from("json:/data.json"))
            .unwrap();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_init_failure_releases_record() {
        let ctx = context(Rc::new(Cell::new(0)));
        let mut realm = Realm::new();
        let err = LoaderBridge::new(&ctx)
            .load(&mut realm, &ModuleName::from("/rejected.js"))
            .unwrap_err();
        let HostError::Load { source, .. } = err else {
            panic!("expected a load failure");
        };
        assert_eq!(source.message(), "Error: init refused");
        assert_eq!(realm.live_module_count(), 0);
    }

    #[test]
    fn test_syntax_error_is_compile_failure() {
        let ctx = context(Rc::new(Cell::new(0)));
        let mut realm = Realm::new();
        let err = LoaderBridge::new(&ctx)
            .load(&mut realm, &ModuleName::from("/broken.js"))
            .unwrap_err();
        assert!(matches!(err, HostError::Compile { .. }));
        assert!(err.to_string().contains("/broken.js:1: unexpected token ';'"));
    }

    #[test]
    fn test_two_loads_two_records() {
        let ctx = context(Rc::new(Cell::new(0)));
        let mut realm = Realm::new();
        let name = ModuleName::from("/twice.js");
        let first = LoaderBridge::new(&ctx).load(&mut realm, &name).unwrap();
        let second = LoaderBridge::new(&ctx).load(&mut realm, &name).unwrap();
        assert_ne!(first, second);
    }
}
