// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The bridge context shared by the resolver and loader bridges.

use crate::error::{HostError, Result};
use quarry_engine::{Exception, JsObject, ModuleName};
use std::fmt;

/// `loader_resolve(specifier, base)`
pub type ResolveFn = dyn Fn(&str, &ModuleName) -> std::result::Result<ModuleName, Exception>;

/// `loader_load(name)`
pub type LoadFn = dyn Fn(&ModuleName) -> std::result::Result<String, Exception>;

/// `loader_init(name, import_meta, namespace)`
pub type InitFn = dyn Fn(&ModuleName, &JsObject, &JsObject) -> std::result::Result<(), Exception>;

/// The policy callbacks that decide how modules are resolved and fetched.
///
/// Only [`LoaderPolicyBuilder::build`] creates one, and it refuses to do so
/// unless both required callbacks are present.
pub struct LoaderPolicy {
    resolve: Box<ResolveFn>,
    load: Box<LoadFn>,
    init: Option<Box<InitFn>>,
}

impl LoaderPolicy {
    /// Starts building a policy.
    pub fn builder() -> LoaderPolicyBuilder {
        LoaderPolicyBuilder::default()
    }

    /// Calls `loader_resolve`.
    pub fn resolve(
        &self,
        specifier: &str,
        base: &ModuleName,
    ) -> std::result::Result<ModuleName, Exception> {
        (self.resolve)(specifier, base)
    }

    /// Calls `loader_load`.
    pub fn load(&self, name: &ModuleName) -> std::result::Result<String, Exception> {
        (self.load)(name)
    }

    /// Calls `loader_init` if one is configured.
    pub fn init(
        &self,
        name: &ModuleName,
        import_meta: &JsObject,
        namespace: &JsObject,
    ) -> std::result::Result<(), Exception> {
        match &self.init {
            Some(init) => init(name, import_meta, namespace),
            None => Ok(()),
        }
    }

    /// Whether `loader_init` is configured.
    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }
}

impl fmt::Debug for LoaderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderPolicy")
            .field("has_init", &self.has_init())
            .finish_non_exhaustive()
    }
}

/// Builder for [`LoaderPolicy`].
#[derive(Default)]
pub struct LoaderPolicyBuilder {
    resolve: Option<Box<ResolveFn>>,
    load: Option<Box<LoadFn>>,
    init: Option<Box<InitFn>>,
}

impl LoaderPolicyBuilder {
    /// Sets `loader_resolve`.
    pub fn resolve<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &ModuleName) -> std::result::Result<ModuleName, Exception> + 'static,
    {
        self.resolve = Some(Box::new(f));
        self
    }

    /// Sets `loader_load`.
    pub fn load<F>(mut self, f: F) -> Self
    where
        F: Fn(&ModuleName) -> std::result::Result<String, Exception> + 'static,
    {
        self.load = Some(Box::new(f));
        self
    }

    /// Sets the optional `loader_init`.
    pub fn init<F>(mut self, f: F) -> Self
    where
        F: Fn(&ModuleName, &JsObject, &JsObject) -> std::result::Result<(), Exception> + 'static,
    {
        self.init = Some(Box::new(f));
        self
    }

    /// Validates that both required callbacks are present.
    pub fn build(self) -> Result<LoaderPolicy> {
        Ok(LoaderPolicy {
            resolve: self.resolve.ok_or(HostError::MissingPolicy("loader_resolve"))?,
            load: self.load.ok_or(HostError::MissingPolicy("loader_load"))?,
            init: self.init,
        })
    }
}

/// State shared by both bridges for the lifetime of one bootstrap.
#[derive(Debug)]
pub struct BridgeContext {
    argv: Vec<String>,
    internals: JsObject,
    policy: LoaderPolicy,
}

impl BridgeContext {
    /// Creates a context.
    pub fn new(argv: Vec<String>, internals: JsObject, policy: LoaderPolicy) -> Self {
        Self {
            argv,
            internals,
            policy,
        }
    }

    /// Process arguments.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The script-visible internals object.
    pub fn internals(&self) -> &JsObject {
        &self.internals
    }

    /// The loader policy.
    pub fn policy(&self) -> &LoaderPolicy {
        &self.policy
    }
}

impl Drop for BridgeContext {
    fn drop(&mut self) {
        tracing::trace!("bridge context released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_callbacks() {
        let err = LoaderPolicy::builder()
            .load(|_| Ok(String::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, HostError::MissingPolicy("loader_resolve")));

        let err = LoaderPolicy::builder()
            .resolve(|s, _| Ok(ModuleName::from(s)))
            .build()
            .unwrap_err();
        assert!(matches!(err, HostError::MissingPolicy("loader_load")));
    }

    #[test]
    fn test_init_is_optional() {
        let policy = LoaderPolicy::builder()
            .resolve(|s, _| Ok(ModuleName::from(s)))
            .load(|_| Ok(String::new()))
            .build()
            .unwrap();
        assert!(!policy.has_init());
        let name = ModuleName::from("m");
        assert!(policy.init(&name, &JsObject::new(), &JsObject::new()).is_ok());
        assert_eq!(policy.resolve("./a.js", &name).unwrap().as_str(), "./a.js");
    }
}
