// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Specifier resolution through the `loader_resolve` policy.

use crate::context::BridgeContext;
use crate::error::{HostError, Result};
use quarry_engine::ModuleName;

/// Maps `(base, specifier)` to a canonical module name.
pub struct ResolverBridge<'a> {
    context: &'a BridgeContext,
}

impl<'a> ResolverBridge<'a> {
    /// Create a resolver over a bridge context
    pub fn new(context: &'a BridgeContext) -> Self {
        Self { context }
    }

    /// Resolves `specifier` as imported from `base`.
    ///
    /// The policy receives the specifier first and the base second.
    pub fn resolve(&self, base: &ModuleName, specifier: &str) -> Result<ModuleName> {
        let name = self
            .context
            .policy()
            .resolve(specifier, base)
            .map_err(|source| HostError::Resolution {
                specifier: specifier.to_string(),
                base: base.clone(),
                source,
            })?;
        tracing::debug!(%specifier, %base, module = %name, "resolved");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LoaderPolicy;
    use quarry_engine::{Exception, JsObject};

    fn context() -> BridgeContext {
        let policy = LoaderPolicy::builder()
            .resolve(|specifier, base| match specifier {
                "bad" => Err(Exception::type_error("bad specifier")),
                _ => Ok(ModuleName::new(format!("{}>{}", base, specifier))),
            })
            .load(|_| Ok(String::new()))
            .build()
            .unwrap();
        BridgeContext::new(Vec::new(), JsObject::new(), policy)
    }

    #[test]
    fn test_argument_order() {
        let ctx = context();
        let name = ResolverBridge::new(&ctx)
            .resolve(&ModuleName::from("base"), "dep")
            .unwrap();
        assert_eq!(name.as_str(), "base>dep");
    }

    #[test]
    fn test_policy_exception_is_kept() {
        let ctx = context();
        let err = ResolverBridge::new(&ctx)
            .resolve(&ModuleName::from("base"), "bad")
            .unwrap_err();
        let HostError::Resolution { specifier, source, .. } = err else {
            panic!("expected a resolution failure");
        };
        assert_eq!(specifier, "bad");
        assert_eq!(source.message(), "TypeError: bad specifier");
    }
}
