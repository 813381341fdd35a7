// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Writes uncaught exceptions to the diagnostic stream.

use quarry_engine::Exception;
use std::io::{self, Write};

/// Reports exceptions as `message`, then the stack if there is one.
#[derive(Debug)]
pub struct ExceptionReporter<W: Write> {
    out: W,
}

impl ExceptionReporter<io::Stderr> {
    /// A reporter writing to standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ExceptionReporter<W> {
    /// Create a reporter writing to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes the exception. Never fails; write errors are only logged.
    pub fn report(&mut self, exception: &Exception) {
        if let Err(err) = self.write(exception) {
            tracing::warn!(error = %err, "failed to report exception");
        }
    }

    fn write(&mut self, exception: &Exception) -> io::Result<()> {
        let mut text = exception.message();
        if let Some(stack) = exception.stack() {
            text.push('\n');
            text.push_str(&stack);
        }
        text.push('\n');
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    /// Consumes the reporter, returning the stream.
    pub fn into_inner(self) -> W {
        self.out
    }
}
