// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The default loader policy for a filesystem embedding.
//!
//! Resolution rules:
//!
//! | Specifier | Result |
//! |-----------|--------|
//! | `quarry:<name>` | `quarry:<name>`, or `json:quarry:<name>` for builtin JSON |
//! | `./x`, `../x`, `/x` | absolute path, symlinks resolved if the file exists |
//! | anything ending in `.json` | the path prefixed with `json:` |
//! | bare names | error |
//!
//! Relative paths resolve against the importing module's directory, or
//! against the working directory when imported from `<input>` or a builtin.
//! Paths that do not exist keep their lexically normalized form.

use crate::config::RuntimeConfig;
use crate::context::LoaderPolicy;
use crate::error::Result;
use crate::module_system::{is_builtin, JSON_PREFIX};
use crate::natives::{fs, INPUT_BASE};
use quarry_engine::{Exception, JsObject, ModuleName, Value};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Prefix of builtin module names.
pub const BUILTIN_PREFIX: &str = "quarry:";

/// Builtin module that receives the internals object on `import.meta`.
pub const INTERNALS_MODULE: &str = "quarry:internal/internals";

static BUILTIN_SPECIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^quarry:[a-z0-9_/-]+$").expect("builtin specifier pattern"));

/// Filesystem loader policy.
#[derive(Debug, Clone)]
pub struct FsPolicy {
    cwd: Option<PathBuf>,
    allow_internal_imports: bool,
}

impl FsPolicy {
    /// Create a policy from the runtime configuration
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            cwd: config.cwd.clone(),
            allow_internal_imports: config.allow_internal_imports,
        }
    }

    /// Wraps the policy into loader callbacks. `internals` is injected into
    /// the internals module's `import.meta`.
    pub fn into_loader_policy(self, internals: JsObject) -> Result<LoaderPolicy> {
        let resolver = self.clone();
        let loader = self.clone();
        LoaderPolicy::builder()
            .resolve(move |specifier, base| resolver.resolve(specifier, base))
            .load(move |name| loader.load(name))
            .init(move |name, meta, _namespace| self.init(&internals, name, meta))
            .build()
    }

    /// `loader_resolve`
    pub fn resolve(
        &self,
        specifier: &str,
        base: &ModuleName,
    ) -> std::result::Result<ModuleName, Exception> {
        let from_builtin = base.starts_with(BUILTIN_PREFIX);

        if specifier.starts_with(BUILTIN_PREFIX) {
            if !BUILTIN_SPECIFIER.is_match(specifier) {
                return Err(Exception::error(format!(
                    "Invalid builtin module specifier {}",
                    quote(specifier)
                )));
            }
            let internal = specifier[BUILTIN_PREFIX.len()..].starts_with("internal/");
            if internal && !from_builtin && !self.allow_internal_imports {
                return Err(Exception::error("External modules may not import quarry internals."));
            }
            let json = format!("{}{}", JSON_PREFIX, specifier);
            return Ok(if is_builtin(&json) {
                ModuleName::new(json)
            } else {
                ModuleName::from(specifier)
            });
        }

        let is_relative = specifier.starts_with("./") || specifier.starts_with("../");
        let path = Path::new(specifier);
        if !is_relative && !path.is_absolute() {
            return Err(Exception::error(format!(
                "Failed to resolve module specifier {} from {}",
                quote(specifier),
                quote(base.as_str())
            )));
        }

        let dir = if base.as_str() == INPUT_BASE || from_builtin {
            self.cwd()?
        } else {
            let base = base.as_str();
            let base_path = Path::new(base.strip_prefix(JSON_PREFIX).unwrap_or(base));
            base_path.parent().map(Path::to_path_buf).unwrap_or_default()
        };
        let normalized = normalize(&dir.join(path));
        let resolved =
            fs::realpath(&normalized).unwrap_or_else(|| normalized.to_string_lossy().into_owned());

        Ok(if resolved.ends_with(".json") {
            ModuleName::new(format!("{}{}", JSON_PREFIX, resolved))
        } else {
            ModuleName::new(resolved)
        })
    }

    /// `loader_load`
    pub fn load(&self, name: &ModuleName) -> std::result::Result<String, Exception> {
        let path = name.as_str().strip_prefix(JSON_PREFIX).unwrap_or(name.as_str());
        let text = if path.starts_with(BUILTIN_PREFIX) {
            None
        } else {
            fs::read_text_file(path)
        };
        text.ok_or_else(|| {
            Exception::error(format!("module at {} not found", quote(name.as_str())))
        })
    }

    /// `loader_init`
    pub fn init(
        &self,
        internals: &JsObject,
        name: &ModuleName,
        meta: &JsObject,
    ) -> std::result::Result<(), Exception> {
        if name.as_str() == INTERNALS_MODULE {
            meta.set("internals", Value::Object(internals.clone()));
        }
        if !name.starts_with(BUILTIN_PREFIX) {
            let policy = self.clone();
            let base = name.clone();
            meta.set(
                "resolve",
                Value::native("resolve", move |_, args| {
                    let specifier = args.first().cloned().unwrap_or_default().to_string();
                    policy
                        .resolve(&specifier, &base)
                        .map(|name| Value::string(name.as_str()))
                }),
            );
        }
        Ok(())
    }

    fn cwd(&self) -> std::result::Result<PathBuf, Exception> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => fs::getcwd()
                .map(PathBuf::from)
                .ok_or_else(|| Exception::error("failed to get cwd")),
        }
    }
}

/// Removes `.` and resolves `..` without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}
