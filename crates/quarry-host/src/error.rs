// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module-loading core

use quarry_engine::{Exception, ModuleName};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for host operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors that can occur while loading modules or bootstrapping
#[derive(Debug, Error)]
pub enum HostError {
    /// The resolve policy threw
    #[error("Error resolving module '{specifier}' from '{base}': {source}")]
    Resolution {
        /// Requested specifier
        specifier: String,
        /// Importing module
        base: ModuleName,
        /// What the policy threw
        source: Exception,
    },

    /// Module bytes could not be obtained, or `loader_init` threw
    #[error("Error loading module '{name}': {source}")]
    Load {
        /// Canonical module name
        name: ModuleName,
        /// What the policy threw
        source: Exception,
    },

    /// A `json:` module did not contain valid JSON
    #[error("Error parsing JSON module '{name}': {source}")]
    Parse {
        /// Canonical module name
        name: ModuleName,
        /// Parser diagnostic
        source: serde_json::Error,
    },

    /// Module source was not valid UTF-8 or did not compile
    #[error("Error compiling module '{name}': {source}")]
    Compile {
        /// Canonical module name
        name: ModuleName,
        /// Engine diagnostic
        source: Exception,
    },

    /// The entry module's evaluation promise was rejected
    #[error("{0}")]
    EntryRejected(Exception),

    /// Calling the entry module's `default` export threw
    #[error("{0}")]
    Invocation(Exception),

    /// A required policy callback was never supplied
    #[error("loader policy is missing the required '{0}' callback")]
    MissingPolicy(&'static str),

    /// The configuration file could not be read or parsed
    #[error("Invalid configuration in {}: {reason}", .path.display())]
    Config {
        /// Configuration file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },
}

impl HostError {
    /// Create a compile failure for bytes that are not UTF-8
    pub fn invalid_utf8(name: &ModuleName, err: std::str::Utf8Error) -> Self {
        Self::Compile {
            name: name.clone(),
            source: Exception::syntax_error(format!(
                "{}: source is not valid UTF-8 ({})",
                name, err
            )),
        }
    }
}

impl From<HostError> for Exception {
    /// Turns a host failure into the value thrown back into the realm.
    ///
    /// Policy and engine exceptions pass through unchanged so scripts see
    /// exactly what was thrown.
    fn from(err: HostError) -> Self {
        match err {
            HostError::Resolution { source, .. }
            | HostError::Load { source, .. }
            | HostError::Compile { source, .. } => source,
            HostError::EntryRejected(exception) | HostError::Invocation(exception) => exception,
            HostError::Parse { name, source } => {
                Exception::syntax_error(format!("{}: {}", name, source))
            }
            other @ (HostError::MissingPolicy(_) | HostError::Config { .. }) => {
                Exception::error(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_exceptions_pass_through() {
        let thrown = Exception::type_error("nope");
        let err = HostError::Resolution {
            specifier: "x".into(),
            base: ModuleName::from("<input>"),
            source: thrown.clone(),
        };
        assert_eq!(err.to_string(), "Error resolving module 'x' from '<input>': TypeError: nope");
        assert_eq!(Exception::from(err).value(), thrown.value());
    }

    #[test]
    fn test_json_failure_becomes_syntax_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = HostError::Parse {
            name: ModuleName::from("json:data.json"),
            source,
        };
        let exception = Exception::from(err);
        assert!(exception.message().starts_with("SyntaxError: json:data.json: "));
    }

    #[test]
    fn test_missing_policy_becomes_error() {
        let exception = Exception::from(HostError::MissingPolicy("loader_load"));
        assert_eq!(
            exception.message(),
            "Error: loader policy is missing the required 'loader_load' callback"
        );
    }
}
