// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HostError, Result};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "quarry.toml";

/// Configuration for a quarry run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directory that `<input>` and builtin-relative specifiers resolve against
    pub cwd: Option<PathBuf>,

    /// `tracing` filter directive used when `QUARRY_LOG` is unset
    pub log_filter: Option<String>,

    /// Lets user modules import `quarry:internal/...`
    pub allow_internal_imports: bool,
}

impl RuntimeConfig {
    /// Loads configuration.
    ///
    /// An explicit path must exist. Without one, `quarry.toml` in the
    /// working directory is used if present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = PathBuf::from(CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.load_from_env();
        Ok(config)
    }

    /// Parses a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| HostError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|err| HostError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Applies `QUARRY_CWD` if set.
    fn load_from_env(&mut self) {
        if let Some(cwd) = std::env::var_os("QUARRY_CWD") {
            self.cwd = Some(PathBuf::from(cwd));
        }
    }
}
