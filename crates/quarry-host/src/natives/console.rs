// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The `console` object. `log`, `info` and `debug` go to stdout; `error`
//! and `warn` go to stderr.

use super::Streams;
use quarry_engine::{JsObject, Value};

/// Builds a console whose methods write to `streams`.
pub fn console_object(streams: &Streams) -> JsObject {
    let console = JsObject::new();
    for (name, fd) in [("log", 1), ("info", 1), ("debug", 1), ("error", 2), ("warn", 2)] {
        let out = streams.clone();
        console.set(
            name,
            Value::native(name, move |_, args| {
                out.write_str(fd, &format_line(args))?;
                Ok(Value::Undefined)
            }),
        );
    }
    console
}

/// Space-joined display form of `args`, newline terminated.
fn format_line(args: &[Value]) -> String {
    let mut line = args.iter().map(Value::to_string).collect::<Vec<_>>().join(" ");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::natives::SharedBuffer;
    use quarry_engine::Realm;

    #[test]
    fn test_levels_pick_streams() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let console = console_object(&Streams::new(out.clone(), err.clone()));
        let mut realm = Realm::new();

        realm.call(&console.get("log"), &[Value::from("a"), Value::Number(1.0)]).unwrap();
        realm.call(&console.get("info"), &[Value::from("b")]).unwrap();
        realm.call(&console.get("debug"), &[]).unwrap();
        realm.call(&console.get("error"), &[Value::from("c"), Value::Boolean(true)]).unwrap();
        realm.call(&console.get("warn"), &[Value::Null]).unwrap();

        assert_eq!(out.contents(), "a 1\nb\n\n");
        assert_eq!(err.contents(), "c true\nnull\n");
    }
}
