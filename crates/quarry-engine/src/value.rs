// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Script value representation.

use crate::error::{ErrorKind, Exception};
use crate::realm::Realm;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A script value.
///
/// Values are cheap to clone: compound values are reference counted and
/// objects share their property table between clones, so a mutation made
/// through one handle is visible through every other.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// undefined
    #[default]
    Undefined,
    /// null
    Null,
    /// Boolean value
    Boolean(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// String
    String(String),
    /// Immutable array
    Array(Arc<Vec<Value>>),
    /// Raw byte buffer (ArrayBuffer)
    ArrayBuffer(Arc<[u8]>),
    /// Object reference
    Object(JsObject),
    /// Native function reference
    Function(Arc<NativeFunction>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            // NaN != NaN falls out of f64 comparison
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::ArrayBuffer(a), Value::ArrayBuffer(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => JsObject::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Creates an array value from its elements.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    /// Wraps a native Rust closure as a callable value.
    pub fn native<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Realm, &[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(NativeFunction::new(name, func)))
    }

    /// Returns true if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true if this value is nullish (null or undefined).
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns true if this value is a function.
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns the string contents if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is a number value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the object handle if this is an object value.
    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Converts the value to a boolean (ToBoolean).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::ArrayBuffer(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Property lookup (`value.key`).
    ///
    /// Arrays answer `length` and numeric indices; other primitives have no
    /// properties. Reading from null or undefined is a `TypeError`.
    pub fn get(&self, key: &str) -> Result<Value, Exception> {
        match self {
            Value::Undefined | Value::Null => Err(Exception::type_error(format!(
                "cannot read properties of {} (reading '{}')",
                self, key
            ))),
            Value::Object(obj) => Ok(obj.get(key)),
            Value::Array(items) => Ok(match key {
                "length" => Value::Number(items.len() as f64),
                _ => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default(),
            }),
            Value::ArrayBuffer(bytes) if key == "byteLength" => {
                Ok(Value::Number(bytes.len() as f64))
            }
            Value::String(s) if key == "length" => {
                Ok(Value::Number(s.encode_utf16().count() as f64))
            }
            Value::Function(func) if key == "name" => Ok(Value::string(func.name())),
            _ => Ok(Value::Undefined),
        }
    }

    /// Converts a parsed JSON document into a script value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => Value::array(arr.iter().map(Value::from_json)),
            serde_json::Value::Object(map) => {
                let obj = JsObject::new();
                for (k, v) in map {
                    obj.set(k.clone(), Value::from_json(v));
                }
                Value::Object(obj)
            }
        }
    }

    /// Converts the value back into JSON, the way `JSON.stringify` would.
    ///
    /// Returns `None` for values JSON cannot represent (undefined, functions,
    /// byte buffers). Object properties holding such values are skipped.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Undefined | Value::Function(_) | Value::ArrayBuffer(_) => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Boolean(b) => Some(serde_json::Value::Bool(*b)),
            Value::Number(n) => Some(number_to_json(*n)),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Array(items) => Some(serde_json::Value::Array(
                items
                    .iter()
                    .map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            )),
            Value::Object(obj) => {
                let map = obj
                    .entries()
                    .into_iter()
                    .filter_map(|(k, v)| v.to_json().map(|j| (k, j)))
                    .collect();
                Some(serde_json::Value::Object(map))
            }
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        write!(f, "NaN")
    } else if n.is_infinite() {
        write!(f, "{}", if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        write!(f, "0")
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(*n, f),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::ArrayBuffer(_) => write!(f, "[object ArrayBuffer]"),
            Value::Object(obj) => write!(f, "{}", obj),
            Value::Function(func) => write!(f, "[Function: {}]", func.name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<JsObject> for Value {
    fn from(obj: JsObject) -> Self {
        Value::Object(obj)
    }
}

/// The internal classification of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Error instance carrying `name`, `message` and possibly `stack`
    Error(ErrorKind),
    /// Module namespace object
    Namespace,
}

struct ObjectData {
    kind: ObjectKind,
    properties: RwLock<BTreeMap<String, Value>>,
}

/// A shared, mutable script object.
#[derive(Clone)]
pub struct JsObject(Arc<ObjectData>);

impl JsObject {
    /// Creates a new empty ordinary object.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Ordinary)
    }

    /// Creates a new empty object of the given kind.
    pub fn with_kind(kind: ObjectKind) -> Self {
        Self(Arc::new(ObjectData {
            kind,
            properties: RwLock::new(BTreeMap::new()),
        }))
    }

    /// Creates an error object with `name` and `message` set.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        let obj = Self::with_kind(ObjectKind::Error(kind));
        obj.set("name", Value::string(kind.name()));
        obj.set("message", Value::String(message.into()));
        obj
    }

    /// Returns the object's kind.
    pub fn kind(&self) -> ObjectKind {
        self.0.kind
    }

    /// Returns true for error instances.
    pub fn is_error(&self) -> bool {
        matches!(self.0.kind, ObjectKind::Error(_))
    }

    /// Gets a property value, `undefined` when absent.
    pub fn get(&self, key: &str) -> Value {
        self.0.properties.read().get(key).cloned().unwrap_or_default()
    }

    /// Checks if a property exists.
    pub fn has(&self, key: &str) -> bool {
        self.0.properties.read().contains_key(key)
    }

    /// Sets a property value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.properties.write().insert(key.into(), value);
    }

    /// Property names in key order.
    pub fn keys(&self) -> Vec<String> {
        self.0.properties.read().keys().cloned().collect()
    }

    /// Snapshot of all properties in key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .properties
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Identity comparison.
    pub fn ptr_eq(a: &JsObject, b: &JsObject) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Default for JsObject {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JsObject {
    // Keys only: objects may reference each other.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsObject")
            .field("kind", &self.0.kind)
            .field("keys", &self.keys())
            .finish()
    }
}

impl fmt::Display for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.kind {
            ObjectKind::Error(kind) => {
                let name = match self.get("name") {
                    Value::Undefined => kind.name().to_string(),
                    other => other.to_string(),
                };
                match self.get("message") {
                    Value::Undefined => write!(f, "{}", name),
                    msg if msg.as_str() == Some("") => write!(f, "{}", name),
                    msg => write!(f, "{}: {}", name, msg),
                }
            }
            ObjectKind::Namespace => write!(f, "[object Module]"),
            ObjectKind::Ordinary => write!(f, "[object Object]"),
        }
    }
}

/// Signature of native function bodies.
pub type NativeFn = dyn Fn(&mut Realm, &[Value]) -> Result<Value, Exception> + Send + Sync;

/// A native (Rust) function callable from scripts.
pub struct NativeFunction {
    name: String,
    func: Box<NativeFn>,
}

impl NativeFunction {
    /// Creates a new native function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Realm, &[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    /// The function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, realm: &mut Realm, args: &[Value]) -> Result<Value, Exception> {
        (self.func)(realm, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion_preserves_structure() {
        let doc = json!({"a": 1, "b": [true, null, "x"], "c": {"d": 2.5}});
        let value = Value::from_json(&doc);
        assert_eq!(value.to_json(), Some(doc));
    }

    #[test]
    fn test_objects_share_properties_between_clones() {
        let obj = JsObject::new();
        let alias = obj.clone();
        alias.set("url", Value::from("quarry:process"));
        assert_eq!(obj.get("url"), Value::from("quarry:process"));
        assert!(JsObject::ptr_eq(&obj, &alias));
    }

    #[test]
    fn test_error_display() {
        let err = JsObject::error(ErrorKind::TypeError, "bad input");
        assert_eq!(err.to_string(), "TypeError: bad input");
        let bare = JsObject::error(ErrorKind::Error, "");
        assert_eq!(bare.to_string(), "Error");
    }

    #[test]
    fn test_number_display() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_property_access_on_nullish_is_type_error() {
        let err = Value::Undefined.get("x").unwrap_err();
        assert!(err.to_string().starts_with("TypeError"));
    }

    #[test]
    fn test_array_properties() {
        let arr = Value::array([Value::from("a"), Value::from("b")]);
        assert_eq!(arr.get("length").unwrap(), Value::Number(2.0));
        assert_eq!(arr.get("1").unwrap(), Value::from("b"));
        assert_eq!(arr.get("7").unwrap(), Value::Undefined);
    }
}
