// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Standard output and error streams used by `print` and `write_str`.

use parking_lot::Mutex;
use quarry_engine::Exception;
use std::io::{self, Write};
use std::sync::Arc;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// The output streams natives write to.
///
/// Cloning shares the underlying writers.
#[derive(Clone)]
pub struct Streams {
    stdout: Sink,
    stderr: Sink,
}

impl Streams {
    /// Process stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    /// Custom writers, e.g. in-memory buffers.
    pub fn new(stdout: impl Write + Send + 'static, stderr: impl Write + Send + 'static) -> Self {
        Self {
            stdout: Arc::new(Mutex::new(Box::new(stdout))),
            stderr: Arc::new(Mutex::new(Box::new(stderr))),
        }
    }

    /// Writes `s` followed by a newline to stdout.
    pub fn print(&self, s: &str) -> Result<(), Exception> {
        let mut out = self.stdout.lock();
        write_all(&mut **out, s.as_bytes())?;
        write_all(&mut **out, b"\n")
    }

    /// Writes `s` to file descriptor 1 or 2.
    pub fn write_str(&self, fd: u32, s: &str) -> Result<(), Exception> {
        let sink = match fd {
            1 => &self.stdout,
            2 => &self.stderr,
            _ => return Err(Exception::range_error(format!("unsupported file descriptor {}", fd))),
        };
        write_all(&mut **sink.lock(), s.as_bytes())
    }
}

impl std::fmt::Debug for Streams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streams").finish_non_exhaustive()
    }
}

fn write_all(out: &mut dyn Write, bytes: &[u8]) -> Result<(), Exception> {
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|err| Exception::error(format!("write failed: {}", err)))
}

/// An in-memory writer whose contents stay readable after being handed to
/// [`Streams::new`].
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Creates an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_and_write_str() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let streams = Streams::new(out.clone(), err.clone());

        streams.print("hello").unwrap();
        streams.write_str(1, "a").unwrap();
        streams.write_str(2, "b").unwrap();

        assert_eq!(out.contents(), "hello\na");
        assert_eq!(err.contents(), "b");
        assert!(streams.write_str(3, "c").is_err());
    }
}
