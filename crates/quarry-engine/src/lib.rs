// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # quarry-engine
//!
//! The module-aware script engine the quarry runtime embeds.
//!
//! ## Overview
//!
//! This crate provides:
//! - a compiler for a declarative subset of ECMAScript module syntax
//! - a [`Realm`] holding the module map, globals and pending-job queue
//! - the [`ModuleLoader`] hook through which embedders resolve and load imports
//!
//! ## Quick Start
//!
//! ```rust
//! use quarry_engine::{JobStatus, ModuleName, PromiseState, Realm, Value};
//!
//! let mut realm = Realm::new();
//! let name = ModuleName::from("main.js");
//! let id = realm.compile_module(&name, "export default 'hello';").unwrap();
//! realm.register_module(name, id).unwrap();
//!
//! let promise = realm.evaluate(id).unwrap();
//! while let JobStatus::Ran = realm.execute_pending_job() {}
//!
//! assert!(matches!(promise.state(), PromiseState::Fulfilled(_)));
//! assert_eq!(realm.namespace(id).unwrap().get("default"), Value::from("hello"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
pub mod job;
pub mod loader;
pub mod module;
pub mod name;
pub mod realm;
pub mod value;

// Re-exports for convenience
pub use error::{ErrorKind, Exception};
pub use job::{JobStatus, Promise, PromiseState};
pub use loader::ModuleLoader;
pub use module::{ModuleId, ModuleStatus};
pub use name::ModuleName;
pub use realm::Realm;
pub use value::{JsObject, NativeFunction, ObjectKind, Value};
