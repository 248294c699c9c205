//! On-disk naming, JSONL framing, and atomic file replacement shared by the
//! file stores.

use crate::error::MemoryError;
use crate::model::ConversationKey;
use log::warn;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Longest hex stem kept verbatim. Leaves room for the longest extension plus
/// the temp suffix under the usual 255-byte file name limit.
const MAX_HEX_STEM: usize = 200;

/// File stem for a key. Both ids are hex-encoded so arbitrary ids map to
/// distinct, filesystem-safe names; `__` cannot occur inside hex. Keys too
/// long for that fall back to a SHA-256 of the length-prefixed ids, marked by
/// a `-` that hex stems never contain.
pub(crate) fn key_stem(key: &ConversationKey) -> String {
    let stem = format!("{}__{}", hex(key.session_id.as_bytes()), hex(key.persona_id.as_bytes()));
    if stem.len() <= MAX_HEX_STEM {
        return stem;
    }
    let mut hasher = Sha256::new();
    for id in [&key.session_id, &key.persona_id] {
        hasher.update((id.len() as u64).to_le_bytes());
        hasher.update(id.as_bytes());
    }
    format!("sha256-{:x}", hasher.finalize())
}

/// Path of a key's file under `root` with the given extension.
pub(crate) fn key_path(root: &Path, key: &ConversationKey, extension: &str) -> PathBuf {
    root.join(format!("{}.{extension}", key_stem(key)))
}

/// Read every record of a JSONL file, or nothing when it does not exist.
///
/// An unparsable final line is the remains of an interrupted append and is
/// skipped with a warning. Damage anywhere else is an error.
pub(crate) fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, MemoryError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let lines = bytes
        .split(|b| *b == b'\n')
        .filter(|line| !line.trim_ascii().is_empty())
        .collect::<Vec<_>>();
    let mut records = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        match serde_json::from_slice(line) {
            Ok(record) => records.push(record),
            Err(err) if idx + 1 == lines.len() => {
                warn!(
                    "skipping torn trailing record (path={}, error={})",
                    path.display(),
                    err
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(records)
}

/// Open a JSONL file for appending, creating it when missing.
///
/// A trailing partial line without its newline is truncated first so the next
/// record starts on a fresh line. Returns the file positioned at its end and
/// whether it is empty.
pub(crate) fn open_append(path: &Path) -> std::io::Result<(File, bool)> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)?;
    let len = file.metadata()?.len();
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            let mut contents = Vec::with_capacity(len as usize);
            file.seek(SeekFrom::Start(0))?;
            file.read_to_end(&mut contents)?;
            let keep = contents
                .iter()
                .rposition(|b| *b == b'\n')
                .map_or(0, |pos| pos + 1) as u64;
            file.set_len(keep)?;
            warn!(
                "truncated torn trailing record (path={}, dropped_bytes={})",
                path.display(),
                len - keep
            );
        }
    }
    let end = file.seek(SeekFrom::End(0))?;
    Ok((file, end == 0))
}

/// Replace `path` with `contents` via a synced temp file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);
    {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&temp_path)?;
        file.write_all(contents)?;
        file.sync_data()?;
    }
    fs::rename(temp_path, path)
}

/// Remove a file, reporting whether it existed.
pub(crate) fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{MAX_HEX_STEM, key_stem, open_append, read_jsonl, remove_if_exists, write_atomic};
    use crate::error::MemoryError;
    use crate::model::ConversationKey;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn key_stem_is_filesystem_safe_and_unambiguous() {
        let stem = key_stem(&ConversationKey::new("a/b", "c"));
        assert_eq!(stem, "612f62__63");
        assert_ne!(
            key_stem(&ConversationKey::new("ab", "c")),
            key_stem(&ConversationKey::new("a", "bc"))
        );
    }

    #[test]
    fn long_keys_fall_back_to_a_fixed_length_digest() {
        let long = ConversationKey::new("s".repeat(130), "maya");
        let stem = key_stem(&long);
        assert!(stem.starts_with("sha256-"));
        assert_eq!(stem.len(), "sha256-".len() + 64);
        assert!(stem.len() <= MAX_HEX_STEM);
        assert_eq!(stem, key_stem(&ConversationKey::new("s".repeat(130), "maya")));
        assert_ne!(
            stem,
            key_stem(&ConversationKey::new("s".repeat(129), "smaya"))
        );
    }

    #[test]
    fn write_atomic_replaces_contents() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("cursor.json");
        write_atomic(&path, b"one").expect("first");
        write_atomic(&path, b"two").expect("second");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "two");
        assert_eq!(remove_if_exists(&path).expect("remove"), true);
        assert_eq!(remove_if_exists(&path).expect("remove again"), false);
    }

    #[test]
    fn torn_final_line_is_skipped_and_repaired_on_append() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("log.jsonl");
        std::fs::write(&path, "{\"n\":1}\n{\"n\":2}\n{\"n\":").expect("seed");

        let records: Vec<Value> = read_jsonl(&path).expect("read");
        assert_eq!(records, vec![json!({"n": 1}), json!({"n": 2})]);

        let (mut file, empty) = open_append(&path).expect("open");
        assert!(!empty);
        file.write_all(b"{\"n\":3}\n").expect("append");
        drop(file);
        let records: Vec<Value> = read_jsonl(&path).expect("read after append");
        assert_eq!(records, vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);
    }

    #[test]
    fn corruption_before_the_last_line_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("log.jsonl");
        std::fs::write(&path, "{\"n\":1}\nnot json\n{\"n\":3}\n").expect("seed");
        assert!(matches!(
            read_jsonl::<Value>(&path),
            Err(MemoryError::Serde(_))
        ));
    }

    #[test]
    fn open_append_reports_empty_after_truncating_a_lone_partial_line() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("log.jsonl");
        std::fs::write(&path, "{\"n\":").expect("seed");
        let (_file, empty) = open_append(&path).expect("open");
        assert!(empty);
        assert_eq!(std::fs::read(&path).expect("read").len(), 0);
    }
}
