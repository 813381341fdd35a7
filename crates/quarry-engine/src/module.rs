// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module records held by a realm.

use crate::compiler::ModuleUnit;
use crate::error::Exception;
use crate::name::ModuleName;
use crate::value::{JsObject, ObjectKind, Value};
use std::fmt;
use std::rc::Rc;

/// Handle to a module record inside one realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a module record.
#[derive(Debug, Clone)]
pub enum ModuleStatus {
    /// Compiled, imports not resolved yet
    Unlinked,
    /// Dependencies resolved and export bindings checked
    Linked,
    /// Scheduled or running
    Evaluating,
    /// Body ran to completion
    Evaluated,
    /// Body threw; the exception is rethrown to later importers
    Errored(Exception),
}

/// What a module evaluates.
#[derive(Debug, Clone)]
pub enum ModuleBody {
    /// Compiled source text
    Source(Rc<ModuleUnit>),
    /// Host-provided exports bound verbatim at evaluation
    Synthetic(Vec<(String, Value)>),
}

/// A module record.
#[derive(Debug)]
pub struct ModuleRecord {
    pub(crate) name: ModuleName,
    pub(crate) body: ModuleBody,
    pub(crate) namespace: JsObject,
    pub(crate) import_meta: JsObject,
    pub(crate) dependencies: Vec<ModuleId>,
    pub(crate) status: ModuleStatus,
    pub(crate) registered: bool,
}

impl ModuleRecord {
    pub(crate) fn new(name: ModuleName, body: ModuleBody) -> Self {
        Self {
            name,
            body,
            namespace: JsObject::with_kind(ObjectKind::Namespace),
            import_meta: JsObject::new(),
            dependencies: Vec::new(),
            status: ModuleStatus::Unlinked,
            registered: false,
        }
    }

    /// The name the module was compiled under.
    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    /// Current lifecycle state.
    pub fn status(&self) -> &ModuleStatus {
        &self.status
    }

    /// Names the module exports.
    pub fn export_names(&self) -> Vec<String> {
        match &self.body {
            ModuleBody::Source(unit) => unit.export_names.clone(),
            ModuleBody::Synthetic(exports) => exports.iter().map(|(k, _)| k.clone()).collect(),
        }
    }

    /// Returns true if the module exports `name`.
    pub fn exports(&self, name: &str) -> bool {
        match &self.body {
            ModuleBody::Source(unit) => unit.exports(name),
            ModuleBody::Synthetic(exports) => exports.iter().any(|(k, _)| k == name),
        }
    }
}
