// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module system bridges
//!
//! Connects the realm's import machinery to the loader policy.
//!
//! ## Resolution
//! - [`ResolverBridge`] hands `(specifier, base)` to `loader_resolve`
//! - The realm reuses any module already registered under the result
//!
//! ## Loading
//! - [`ByteSource`] serves the builtin table, then `loader_load`
//! - `json:` names become synthetic modules with a single `default` export
//! - Everything else is compiled, gets `import.meta.url` and goes through `loader_init`

mod byte_source;
mod json;
mod loader;
mod resolver;

pub use byte_source::{builtin, is_builtin, ByteSource, ModuleBytes, BUILTIN_MODULES, ENTRY_MODULE};
pub use json::JsonSynthesizer;
pub use loader::{is_json_module, LoaderBridge, ModuleHooks, JSON_PREFIX};
pub use resolver::ResolverBridge;
