// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native capabilities exposed to scripts through the internals object.
//!
//! Each capability is a plain Rust function in a submodule; this module
//! wraps them as script functions and assembles the internals object that
//! the entry module receives.

pub mod console;
pub mod encoding;
pub mod fs;
pub mod io;

pub use io::{SharedBuffer, Streams};

use quarry_engine::{Exception, JobStatus, JsObject, ModuleName, PromiseState, Realm, Value};

/// Base name used for the module named on the command line.
pub const INPUT_BASE: &str = "<input>";

/// Usage line written when no module is given.
pub const USAGE: &str = "usage: quarry <import_specifier>\n";

/// Builds the internals object: `argv` plus every native capability.
pub fn internals_object(argv: &[String], streams: Streams) -> JsObject {
    let internals = JsObject::new();
    internals.set("argv", Value::array(argv.iter().map(|a| Value::string(a.as_str()))));

    let out = streams.clone();
    internals.set(
        "print",
        Value::native("print", move |_, args| {
            out.print(&string_arg(args, 0))?;
            Ok(Value::Undefined)
        }),
    );

    let out = streams.clone();
    internals.set(
        "write_str",
        Value::native("write_str", move |_, args| {
            let fd = index_arg(args, 0, "fd")?;
            let fd = u32::try_from(fd).map_err(|_| {
                Exception::range_error(format!("unsupported file descriptor {}", fd))
            })?;
            out.write_str(fd, &string_arg(args, 1))?;
            Ok(Value::Undefined)
        }),
    );

    internals.set(
        "encode_utf8",
        Value::native("encode_utf8", |_, args| {
            Ok(Value::ArrayBuffer(encoding::encode_utf8(&string_arg(args, 0))))
        }),
    );

    internals.set(
        "decode_utf8",
        Value::native("decode_utf8", |_, args| {
            let Some(Value::ArrayBuffer(bytes)) = args.first() else {
                return Err(Exception::type_error("decode_utf8: expected an ArrayBuffer"));
            };
            let offset = index_arg(args, 1, "offset")?;
            let length = match args.get(2) {
                None | Some(Value::Undefined) => None,
                Some(_) => Some(index_arg(args, 2, "length")?),
            };
            let fatal = args.get(3).is_some_and(Value::to_boolean);
            encoding::decode_utf8(bytes, offset, length, fatal).map(Value::String)
        }),
    );

    internals.set("TextEncoder", encoding::text_encoder());
    internals.set("TextDecoder", encoding::text_decoder());
    internals.set("console", Value::Object(console::console_object(&streams)));

    internals.set(
        "realpath",
        Value::native("realpath", |_, args| {
            Ok(optional(fs::realpath(string_arg(args, 0))))
        }),
    );

    internals.set(
        "getcwd",
        Value::native("getcwd", |_, _| Ok(optional(fs::getcwd()))),
    );

    internals.set(
        "readtextfile",
        Value::native("readtextfile", |_, args| {
            Ok(optional(fs::read_text_file(string_arg(args, 0))))
        }),
    );

    internals.set(
        "getmode",
        Value::native("getmode", |_, args| {
            Ok(fs::file_mode(string_arg(args, 0))
                .map(|mode| Value::Number(f64::from(mode)))
                .unwrap_or_default())
        }),
    );

    internals.set(
        "execute_pending_job",
        Value::native("execute_pending_job", |realm, _| match realm.execute_pending_job() {
            JobStatus::Ran => Ok(Value::Boolean(true)),
            JobStatus::Idle => Ok(Value::Boolean(false)),
            JobStatus::Failed(exception) => Err(exception),
        }),
    );

    let err = streams;
    internals.set(
        "run_main",
        Value::native("run_main", move |realm, args| {
            let internals = args.first().cloned().unwrap_or_default();
            run_main(realm, &internals, &err)
        }),
    );

    internals
}

/// Names copied from the internals object onto the realm's globals.
const GLOBAL_NAMES: [&str; 3] = ["console", "TextEncoder", "TextDecoder"];

/// Installs the script-visible globals, then imports the module named by
/// `argv[1]` and runs it to completion.
fn run_main(realm: &mut Realm, internals: &Value, streams: &Streams) -> Result<Value, Exception> {
    let argv = internals.get("argv")?;
    let argc = argv.get("length")?.as_number().unwrap_or(0.0) as usize;
    if argc < 2 {
        streams.write_str(2, USAGE)?;
        return Ok(Value::Undefined);
    }

    let globals = realm.globals().clone();
    for name in GLOBAL_NAMES {
        globals.set(name, internals.get(name)?);
    }
    globals.set("self", Value::Object(globals.clone()));

    let specifier = argv.get("1")?.to_string();
    tracing::debug!(%specifier, "running main module");
    let promise = realm.import(&specifier, &ModuleName::from(INPUT_BASE));
    loop {
        match realm.execute_pending_job() {
            JobStatus::Ran => continue,
            JobStatus::Idle => break,
            JobStatus::Failed(exception) => return Err(exception),
        }
    }

    match promise.state() {
        PromiseState::Fulfilled(_) => Ok(Value::Undefined),
        PromiseState::Rejected(exception) => Err(exception),
        PromiseState::Pending => Err(Exception::error(format!(
            "module '{}' never finished evaluating",
            specifier
        ))),
    }
}

fn string_arg(args: &[Value], index: usize) -> String {
    args.get(index).cloned().unwrap_or_default().to_string()
}

fn index_arg(args: &[Value], index: usize, what: &str) -> Result<usize, Exception> {
    let n = args.get(index).and_then(Value::as_number).unwrap_or(0.0);
    if n < 0.0 || n.fract() != 0.0 || !n.is_finite() {
        return Err(Exception::range_error(format!(
            "{} must be a non-negative integer, got {}",
            what, n
        )));
    }
    Ok(n as usize)
}

fn optional(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or_default()
}
