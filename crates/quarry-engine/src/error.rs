// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Thrown exceptions and native error kinds.

use crate::value::{JsObject, Value};
use thiserror::Error;

/// Native error constructor kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error
    Error,
    /// TypeError
    TypeError,
    /// SyntaxError
    SyntaxError,
    /// ReferenceError
    ReferenceError,
    /// RangeError
    RangeError,
}

impl ErrorKind {
    /// The constructor name.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
        }
    }

    /// All kinds installed as realm globals.
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::SyntaxError,
        ErrorKind::ReferenceError,
        ErrorKind::RangeError,
    ];
}

/// A value thrown by script or native code.
///
/// Any value may be thrown; error objects additionally carry a `stack`
/// property once the exception has passed through a module frame.
#[derive(Debug, Clone, Error)]
#[error("{value}")]
pub struct Exception {
    value: Value,
}

impl Exception {
    /// Throws an arbitrary value.
    pub fn throw(value: Value) -> Self {
        Self { value }
    }

    /// Throws a fresh error object of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::throw(Value::Object(JsObject::error(kind, message)))
    }

    /// Create a new Error
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error, message)
    }

    /// Create a new TypeError
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// Create a new SyntaxError
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    /// Create a new ReferenceError
    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReferenceError, message)
    }

    /// Create a new RangeError
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RangeError, message)
    }

    /// The thrown value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns true if the thrown value is an error object.
    pub fn is_error(&self) -> bool {
        self.value.as_object().is_some_and(JsObject::is_error)
    }

    /// The displayable message (`String(value)`).
    pub fn message(&self) -> String {
        self.value.to_string()
    }

    /// The stack trace of a thrown error object, if it has one.
    pub fn stack(&self) -> Option<String> {
        let obj = self.value.as_object().filter(|o| o.is_error())?;
        match obj.get("stack") {
            Value::Undefined => None,
            stack => Some(stack.to_string()),
        }
    }

    /// Records the frame an error object was thrown from.
    ///
    /// Only the innermost frame is kept; later frames leave an existing
    /// stack untouched.
    pub fn with_frame(self, frame: impl AsRef<str>) -> Self {
        if let Some(obj) = self.value.as_object().filter(|o| o.is_error()) {
            if !obj.has("stack") {
                obj.set("stack", Value::String(format!("    at {}", frame.as_ref())));
            }
        }
        self
    }
}

impl From<Value> for Exception {
    fn from(value: Value) -> Self {
        Self::throw(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_and_stack() {
        let exc = Exception::error("boom").with_frame("quarry:internal/stage0:3");
        assert!(exc.is_error());
        assert_eq!(exc.message(), "Error: boom");
        assert_eq!(exc.stack().as_deref(), Some("    at quarry:internal/stage0:3"));
    }

    #[test]
    fn test_innermost_frame_wins() {
        let exc = Exception::type_error("x")
            .with_frame("inner.js:1")
            .with_frame("outer.js:9");
        assert_eq!(exc.stack().as_deref(), Some("    at inner.js:1"));
    }

    #[test]
    fn test_thrown_primitive_has_no_stack() {
        let exc = Exception::throw(Value::from("boom")).with_frame("main.js:1");
        assert!(!exc.is_error());
        assert_eq!(exc.message(), "boom");
        assert_eq!(exc.stack(), None);
    }
}
