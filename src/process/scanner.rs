//! Process scanning utilities for discovering and reading process entries from /proc.
//!
//! This module provides functions to enumerate live pids and read the small
//! per-process files the feed needs: the short name and the parent pid.

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Scans the proc root for directories with numeric names.
///
/// An unreadable root yields an empty list; the caller treats that as
/// "no process observed this tick".
pub fn collect_pids(root: &Path) -> Vec<u32> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(v) => v,
                None => continue,
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Ok(pid) = name.parse::<u32>() {
                out.push(pid);
            }
        }
    }
    out
}

/// Reads the process name from the comm file.
///
/// Only a single trailing newline is removed; the rest of the name is kept as is.
pub fn read_process_name(proc_path: &Path, buf_kb: usize) -> Option<String> {
    let file = fs::File::open(proc_path.join("comm")).ok()?;
    let mut reader = BufReader::with_capacity(buf_kb.max(1) * 1024, file);
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).ok()?;

    if raw.last() == Some(&b'\n') {
        raw.pop();
    }
    Some(String::from_utf8_lossy(&raw).into_owned())
}

/// Reads the parent pid from the status file, taking the first `PPid:` line.
pub fn read_parent_pid(proc_path: &Path, buf_kb: usize) -> Option<u32> {
    let file = fs::File::open(proc_path.join("status")).ok()?;
    let reader = BufReader::with_capacity(buf_kb.max(1) * 1024, file);

    for line in reader.lines() {
        let l = line.ok()?;
        if let Some(v) = l.strip_prefix("PPid:") {
            if let Ok(ppid) = v.trim().parse::<u32>() {
                return Some(ppid);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_collect_pids_skips_non_numeric() {
        let dir = tempdir().expect("Failed to create temp dir");
        for name in ["1", "42", "self", "sys", "1a", "31337"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("uptime"), "1.0 2.0\n").unwrap();

        let mut pids = collect_pids(dir.path());
        pids.sort_unstable();
        assert_eq!(pids, vec![1, 42, 31337]);
    }

    #[test]
    fn test_collect_pids_missing_root() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(collect_pids(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_read_process_name_strips_one_newline() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("comm"), "kworker/0:1 \n").unwrap();
        assert_eq!(
            read_process_name(dir.path(), 4).as_deref(),
            Some("kworker/0:1 ")
        );
    }

    #[test]
    fn test_read_process_name_missing_and_empty() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert_eq!(read_process_name(dir.path(), 4), None);

        fs::write(dir.path().join("comm"), "").unwrap();
        assert_eq!(read_process_name(dir.path(), 4).as_deref(), Some(""));
    }

    #[test]
    fn test_read_parent_pid() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("status"),
            "Name:\tworker\nUmask:\t0022\nState:\tS (sleeping)\nTgid:\t100\nPid:\t100\nPPid:\t1\nTracerPid:\t0\n",
        )
        .unwrap();
        assert_eq!(read_parent_pid(dir.path(), 4), Some(1));
    }

    #[test]
    fn test_read_parent_pid_absent() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert_eq!(read_parent_pid(dir.path(), 4), None);

        fs::write(dir.path().join("status"), "Name:\tworker\nPid:\t100\n").unwrap();
        assert_eq!(read_parent_pid(dir.path(), 4), None);
    }
}
