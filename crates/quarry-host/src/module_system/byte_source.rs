// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module source bytes: the compiled-in builtin table first, then the
//! `loader_load` policy.

use crate::context::BridgeContext;
use crate::error::{HostError, Result};
use quarry_engine::ModuleName;
use std::ops::Deref;

/// Canonical name of the entry module.
pub const ENTRY_MODULE: &str = "quarry:internal/stage0";

/// Builtin modules compiled into the binary, keyed by canonical name.
pub static BUILTIN_MODULES: &[(&str, &[u8])] = &[
    (ENTRY_MODULE, include_bytes!("../../lib/stage0.js")),
    ("quarry:internal/internals", include_bytes!("../../lib/internals.js")),
    ("quarry:process", include_bytes!("../../lib/process.js")),
    ("quarry:fs", include_bytes!("../../lib/fs.js")),
    ("quarry:console", include_bytes!("../../lib/console.js")),
    ("quarry:encoding", include_bytes!("../../lib/encoding.js")),
    ("json:quarry:internal/build-info", include_bytes!("../../lib/build-info.json")),
];

/// Looks up a builtin module by exact canonical name.
pub fn builtin(name: &str) -> Option<&'static [u8]> {
    BUILTIN_MODULES
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, bytes)| *bytes)
}

/// Returns true if `name` is in the builtin table.
pub fn is_builtin(name: &str) -> bool {
    builtin(name).is_some()
}

/// Module source bytes.
///
/// Static bytes come from the builtin table and are never freed; owned
/// bytes come from the load policy and are dropped with the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleBytes {
    /// Borrowed from the builtin table
    Static(&'static [u8]),
    /// Returned by `loader_load`
    Owned(Box<[u8]>),
}

impl ModuleBytes {
    /// The bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ModuleBytes::Static(bytes) => bytes,
            ModuleBytes::Owned(bytes) => bytes,
        }
    }

    /// Returns true for builtin-table bytes.
    pub fn is_static(&self) -> bool {
        matches!(self, ModuleBytes::Static(_))
    }
}

impl Deref for ModuleBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<String> for ModuleBytes {
    fn from(source: String) -> Self {
        ModuleBytes::Owned(source.into_bytes().into_boxed_slice())
    }
}

/// Fetches module bytes by canonical name.
pub struct ByteSource<'a> {
    context: &'a BridgeContext,
}

impl<'a> ByteSource<'a> {
    /// Create a byte source over a bridge context
    pub fn new(context: &'a BridgeContext) -> Self {
        Self { context }
    }

    /// Returns the bytes for `name`.
    pub fn fetch(&self, name: &ModuleName) -> Result<ModuleBytes> {
        if let Some(bytes) = builtin(name.as_str()) {
            tracing::trace!(module = %name, "builtin module");
            return Ok(ModuleBytes::Static(bytes));
        }

        let source = self
            .context
            .policy()
            .load(name)
            .map_err(|source| HostError::Load {
                name: name.clone(),
                source,
            })?;
        tracing::trace!(module = %name, bytes = source.len(), "module loaded by policy");
        Ok(ModuleBytes::from(source))
    }
}
