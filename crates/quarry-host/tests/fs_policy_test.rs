// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! End-to-end runs against real files through the filesystem policy.

use quarry_host::natives::{internals_object, SharedBuffer};
use quarry_host::{
    Bootstrap, BootstrapState, BridgeContext, ExceptionReporter, FsPolicy, RuntimeConfig, Streams,
};
use std::fs;
use std::path::{Path, PathBuf};

struct Run {
    state: BootstrapState,
    stdout: String,
    stderr: String,
    diagnostics: String,
}

fn run_in(dir: &Path, config: RuntimeConfig, args: &[&str]) -> Run {
    let config = RuntimeConfig {
        cwd: Some(dir.to_path_buf()),
        ..config
    };
    let argv: Vec<String> = std::iter::once("quarry")
        .chain(args.iter().copied())
        .map(String::from)
        .collect();

    let stdout = SharedBuffer::new();
    let stderr = SharedBuffer::new();
    let internals = internals_object(&argv, Streams::new(stdout.clone(), stderr.clone()));
    let policy = FsPolicy::new(&config)
        .into_loader_policy(internals.clone())
        .unwrap();
    let context = BridgeContext::new(argv, internals, policy);

    let mut diagnostics = Vec::new();
    let state = Bootstrap::new(context, ExceptionReporter::new(&mut diagnostics)).run();
    Run {
        state,
        stdout: stdout.contents(),
        stderr: stderr.contents(),
        diagnostics: String::from_utf8(diagnostics).unwrap(),
    }
}

/// Module names carry symlink-free paths, so expectations use the
/// canonical form of the temporary directory.
fn canonical_root(dir: &tempfile::TempDir) -> PathBuf {
    fs::canonicalize(dir.path()).unwrap()
}

#[test]
fn test_program_with_builtins_json_and_relative_imports() {
    let dir = tempfile::tempdir().unwrap();
    let root = &canonical_root(&dir);
    fs::create_dir(root.join("lib")).unwrap();
    fs::write(root.join("data.json"), r#"{ "name": "quarry", "tags": ["a", "b"] }"#).unwrap();
    fs::write(
        root.join("lib/helper.js"),
        "import data from '../data.json';
export const name = data.name;
export default import.meta.resolve('../data.json');
",
    )
    .unwrap();
    fs::write(
        root.join("main.js"),
        r#"
import { log } from "quarry:console";
import { argv, version } from "quarry:process";
import data from "./data.json";
import where, { name } from "./lib/helper.js";

log(name);
log(data.tags.length);
log(argv.length);
log(version);
log(where);
log(import.meta.url);
"#,
    )
    .unwrap();

    let run = run_in(root, RuntimeConfig::default(), &["./main.js", "extra"]);
    assert_eq!(run.diagnostics, "");
    assert_eq!(run.state, BootstrapState::Done);

    let lines: Vec<&str> = run.stdout.lines().collect();
    assert_eq!(lines[..4], ["quarry", "2", "3", quarry_host::VERSION]);
    assert_eq!(lines[4], format!("json:{}", root.join("data.json").display()));
    assert_eq!(lines[5], root.join("main.js").display().to_string());
}

#[test]
fn test_external_modules_cannot_import_internals() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.js"),
        "import { internals } from 'quarry:internal/internals';",
    )
    .unwrap();

    let run = run_in(dir.path(), RuntimeConfig::default(), &["./main.js"]);
    assert_eq!(run.state, BootstrapState::Invoked);
    assert!(run
        .diagnostics
        .starts_with("Error: External modules may not import quarry internals.\n"));
}

#[test]
fn test_internal_imports_allowed_by_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.js"),
        "import { internals } from 'quarry:internal/internals';\ninternals.print('inside');",
    )
    .unwrap();

    let config = RuntimeConfig {
        allow_internal_imports: true,
        ..RuntimeConfig::default()
    };
    let run = run_in(dir.path(), config, &["./main.js"]);
    assert_eq!(run.diagnostics, "");
    assert_eq!(run.stdout, "inside\n");
}

#[test]
fn test_missing_file_and_bare_specifier() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.js"), "import x from './nope.js';").unwrap();

    let root = canonical_root(&dir);
    let run = run_in(&root, RuntimeConfig::default(), &["./main.js"]);
    let missing = root.join("nope.js");
    assert_eq!(
        run.diagnostics,
        format!(
            "Error: module at \"{}\" not found\n    at {}:1\n",
            missing.display(),
            root.join("main.js").display()
        )
    );

    let run = run_in(&root, RuntimeConfig::default(), &["lodash"]);
    assert_eq!(
        run.diagnostics,
        "Error: Failed to resolve module specifier \"lodash\" from \"<input>\"\n"
    );
}

#[test]
fn test_fs_builtin_reads_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("note.txt"), "hello\n").unwrap();
    fs::write(
        dir.path().join("main.js"),
        "import { readTextFileSync } from 'quarry:fs';
import { log } from 'quarry:console';
log(readTextFileSync(import.meta.resolve('./note.txt')));",
    )
    .unwrap();

    let run = run_in(dir.path(), RuntimeConfig::default(), &["./main.js"]);
    assert_eq!(run.diagnostics, "");
    assert_eq!(run.stdout, "hello\n\n");
}

#[test]
fn test_console_and_encoding_globals() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.js"),
        r#"
import { TextDecoder } from "quarry:encoding";
import { warn } from "quarry:console";

const bytes = new TextEncoder().encode("héllo");
console.log("bytes", bytes.byteLength);
console.log(new TextDecoder("utf-8").decode(bytes));
console.error("oops", 1);
self.console.info(self.self.TextDecoder.name);
warn("careful");
"#,
    )
    .unwrap();

    let run = run_in(dir.path(), RuntimeConfig::default(), &["./main.js"]);
    assert_eq!(run.diagnostics, "");
    assert_eq!(run.state, BootstrapState::Done);
    assert_eq!(run.stdout, "bytes 6\nhéllo\nTextDecoder\n");
    assert_eq!(run.stderr, "oops 1\ncareful\n");
}

#[cfg(unix)]
#[test]
fn test_symlinked_module_is_evaluated_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = canonical_root(&dir);
    fs::create_dir(root.join("real")).unwrap();
    fs::write(
        root.join("real/counter.js"),
        "console.log('evaluated');\nexport default {};\n",
    )
    .unwrap();
    std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();
    fs::write(
        root.join("main.js"),
        "import a from './real/counter.js';
import b from './link/counter.js';
console.log(a.x, b.x);
",
    )
    .unwrap();

    let run = run_in(&root, RuntimeConfig::default(), &["./main.js"]);
    assert_eq!(run.diagnostics, "");
    assert_eq!(run.stdout, "evaluated\nundefined undefined\n");
}

#[test]
fn test_build_info_matches_crate_version() {
    let info: serde_json::Value =
        serde_json::from_str(include_str!("../lib/build-info.json")).unwrap();
    assert_eq!(info["version"], quarry_host::VERSION);
}
