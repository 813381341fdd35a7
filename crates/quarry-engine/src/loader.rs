// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The hook a realm calls to turn import specifiers into modules.

use crate::error::Exception;
use crate::module::ModuleId;
use crate::name::ModuleName;
use crate::realm::Realm;

/// Embedder-provided module resolution and loading.
///
/// The realm consults the loader for every import it cannot satisfy from
/// its module map: `resolve` maps a specifier to a canonical name, and if
/// no module is registered under that name, `load` produces a compiled but
/// unregistered module which the realm then registers under the name.
pub trait ModuleLoader {
    /// Maps `specifier`, imported from `base`, to a canonical module name.
    fn resolve(
        &self,
        realm: &mut Realm,
        base: &ModuleName,
        specifier: &str,
    ) -> Result<ModuleName, Exception>;

    /// Produces the module for a canonical name.
    fn load(&self, realm: &mut Realm, name: &ModuleName) -> Result<ModuleId, Exception>;
}
