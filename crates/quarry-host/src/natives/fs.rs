// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Filesystem natives. Every failure is reported as `None`.

use std::path::Path;

/// Canonical absolute path with symlinks resolved.
pub fn realpath(path: impl AsRef<Path>) -> Option<String> {
    std::fs::canonicalize(path)
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

/// Current working directory.
pub fn getcwd() -> Option<String> {
    std::env::current_dir()
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

/// Whole file as text. Invalid UTF-8 is replaced rather than rejected.
pub fn read_text_file(path: impl AsRef<Path>) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    Some(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

/// `st_mode` of the file (type and permission bits).
#[cfg(unix)]
pub fn file_mode(path: impl AsRef<Path>) -> Option<u32> {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata(path).ok().map(|m| m.mode())
}

/// `st_mode` of the file, synthesized from the file type.
#[cfg(not(unix))]
pub fn file_mode(path: impl AsRef<Path>) -> Option<u32> {
    let meta = std::fs::metadata(path).ok()?;
    let kind = if meta.is_dir() { S_IFDIR } else { S_IFREG };
    let perm = if meta.permissions().readonly() { 0o444 } else { 0o644 };
    Some(kind | perm)
}

/// Directory file type.
pub const S_IFDIR: u32 = 0o040000;
/// Regular file type.
pub const S_IFREG: u32 = 0o100000;

#[cfg(test)]
mod tests {
    use super::*;

    const S_IFMT: u32 = 0o170000;

    #[test]
    fn test_read_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "contents").unwrap();

        assert_eq!(read_text_file(&file).as_deref(), Some("contents"));
        assert_eq!(file_mode(&file).unwrap() & S_IFMT, S_IFREG);
        assert_eq!(file_mode(dir.path()).unwrap() & S_IFMT, S_IFDIR);
        assert!(realpath(&file).is_some());
    }

    #[test]
    fn test_missing_paths_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert_eq!(read_text_file(&missing), None);
        assert_eq!(file_mode(&missing), None);
        assert_eq!(realpath(&missing), None);
    }

    #[test]
    fn test_getcwd() {
        assert!(getcwd().is_some());
    }
}
