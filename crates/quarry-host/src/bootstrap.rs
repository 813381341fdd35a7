// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bootstrap sequencing.
//!
//! Creates a realm, installs the module hooks, evaluates the entry module
//! and calls its `default` export with the internals object. Every failure
//! is written to the reporter; nothing is returned to the caller except the
//! state the sequence stopped in.

use crate::context::BridgeContext;
use crate::error::{HostError, Result};
use crate::module_system::{LoaderBridge, ModuleHooks, ENTRY_MODULE};
use crate::reporter::ExceptionReporter;
use quarry_engine::{Exception, JobStatus, ModuleName, PromiseState, Realm, Value};
use std::fmt;
use std::io::Write;
use std::rc::Rc;

/// Where a bootstrap run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// Nothing has happened yet
    Created,
    /// Realm exists and the bridges are installed
    HooksInstalled,
    /// Entry module compiled and registered
    EntryCompiled,
    /// Entry module linked and its jobs are being pumped
    EntryEvaluating,
    /// Entry module failed to link or evaluate
    EntryRejected,
    /// Entry module evaluated
    EntryFulfilled,
    /// The entry's default export was called
    Invoked,
    /// The default export returned normally
    Done,
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapState::Created => "created",
            BootstrapState::HooksInstalled => "hooks installed",
            BootstrapState::EntryCompiled => "entry compiled",
            BootstrapState::EntryEvaluating => "entry evaluating",
            BootstrapState::EntryRejected => "entry rejected",
            BootstrapState::EntryFulfilled => "entry fulfilled",
            BootstrapState::Invoked => "invoked",
            BootstrapState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs the entry module once.
pub struct Bootstrap<W: Write> {
    context: Rc<BridgeContext>,
    reporter: ExceptionReporter<W>,
    state: BootstrapState,
}

impl<W: Write> Bootstrap<W> {
    /// Create a bootstrap over `context`, reporting failures to `reporter`
    pub fn new(context: BridgeContext, reporter: ExceptionReporter<W>) -> Self {
        Self {
            context: Rc::new(context),
            reporter,
            state: BootstrapState::Created,
        }
    }

    /// Runs the sequence to completion and returns the final state.
    ///
    /// The realm is dropped before the context on every path.
    pub fn run(mut self) -> BootstrapState {
        let mut realm = Realm::new();

        if let Err(err) = self.drive(&mut realm) {
            tracing::debug!(state = %self.state, error = %err, "bootstrap failed");
            self.reporter.report(&Exception::from(err));
        }

        drop(realm);
        let Self { context, state, .. } = self;
        drop(context);
        tracing::debug!(%state, "bootstrap finished");
        state
    }

    fn drive(&mut self, realm: &mut Realm) -> Result<()> {
        realm.set_module_loader(Rc::new(ModuleHooks::new(Rc::clone(&self.context))));
        self.advance(BootstrapState::HooksInstalled);

        let entry = ModuleName::from(ENTRY_MODULE);
        let id = LoaderBridge::new(&self.context).load(realm, &entry)?;
        realm
            .register_module(entry.clone(), id)
            .map_err(|source| HostError::Compile {
                name: entry.clone(),
                source,
            })?;
        self.advance(BootstrapState::EntryCompiled);

        self.advance(BootstrapState::EntryEvaluating);
        let promise = realm.evaluate(id).map_err(|e| self.reject(e))?;
        loop {
            match realm.execute_pending_job() {
                JobStatus::Ran => continue,
                JobStatus::Idle => break,
                JobStatus::Failed(exception) => return Err(self.reject(exception)),
            }
        }
        match promise.state() {
            PromiseState::Fulfilled(_) => {}
            PromiseState::Rejected(exception) => return Err(self.reject(exception)),
            PromiseState::Pending => {
                return Err(self.reject(Exception::error(format!(
                    "entry module '{}' did not finish evaluating",
                    entry
                ))));
            }
        }
        self.advance(BootstrapState::EntryFulfilled);

        let main = realm.namespace(id).map_err(HostError::Invocation)?.get("default");
        if !main.is_function() {
            return Err(HostError::Invocation(Exception::type_error(format!(
                "the default export of '{}' is not a function",
                entry
            ))));
        }
        self.advance(BootstrapState::Invoked);
        realm
            .call(&main, &[Value::Object(self.context.internals().clone())])
            .map_err(HostError::Invocation)?;
        self.advance(BootstrapState::Done);
        Ok(())
    }

    fn advance(&mut self, state: BootstrapState) {
        tracing::trace!(from = %self.state, to = %state, "bootstrap");
        self.state = state;
    }

    fn reject(&mut self, exception: Exception) -> HostError {
        self.advance(BootstrapState::EntryRejected);
        HostError::EntryRejected(exception)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LoaderPolicy;
    use crate::natives::{internals_object, SharedBuffer, Streams};

    #[test]
    fn test_default_export_receives_internals() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let streams = Streams::new(out.clone(), err.clone());
        let internals = internals_object(&["quarry".into()], streams);
        let injected = internals.clone();
        let policy = LoaderPolicy::builder()
            .resolve(|s, _| Ok(ModuleName::from(s)))
            .load(|name| Err(Exception::error(format!("no {}", name))))
            .init(move |name, meta, _| {
                if name.as_str() == "quarry:internal/internals" {
                    meta.set("internals", Value::Object(injected.clone()));
                }
                Ok(())
            })
            .build()
            .unwrap();
        let context = BridgeContext::new(vec!["quarry".into()], internals, policy);

        let state = Bootstrap::new(context, ExceptionReporter::new(Vec::new())).run();
        assert_eq!(state, BootstrapState::Done);
        assert_eq!(err.contents(), "usage: quarry <import_specifier>\n");
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn test_display() {
        assert_eq!(BootstrapState::EntryRejected.to_string(), "entry rejected");
    }
}
