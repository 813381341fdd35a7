// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # quarry-host
//!
//! The module-loading core of the quarry runtime.
//!
//! This crate connects a [`quarry_engine::Realm`] to a host:
//!
//! - Resolver and loader bridges driven by a pluggable [`LoaderPolicy`]
//! - A compiled-in table of builtin modules (`quarry:*`)
//! - JSON modules (`json:*`) synthesized without compilation
//! - The bootstrap sequence that evaluates the entry module and runs `main`
//! - Native capabilities (I/O, UTF-8, filesystem) for scripts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quarry_host::{
//!     Bootstrap, BridgeContext, ExceptionReporter, FsPolicy, RuntimeConfig, Streams,
//! };
//!
//! fn main() -> quarry_host::Result<()> {
//!     let argv: Vec<String> = std::env::args().collect();
//!     let config = RuntimeConfig::load(None)?;
//!     let internals = quarry_host::natives::internals_object(&argv, Streams::stdio());
//!     let policy = FsPolicy::new(&config).into_loader_policy(internals.clone())?;
//!     let context = BridgeContext::new(argv, internals, policy);
//!     Bootstrap::new(context, ExceptionReporter::stderr()).run();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod error;
pub mod module_system;
pub mod natives;
pub mod policy;
pub mod reporter;

// Re-exports
pub use bootstrap::{Bootstrap, BootstrapState};
pub use config::RuntimeConfig;
pub use context::{BridgeContext, LoaderPolicy, LoaderPolicyBuilder};
pub use error::{HostError, Result};
pub use natives::Streams;
pub use policy::FsPolicy;
pub use reporter::ExceptionReporter;

/// Version of the quarry runtime
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
