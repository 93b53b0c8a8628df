//! Memory parsing utilities for reading per-process private memory from /proc.
//!
//! This module provides functions to sum the private (unshared) memory of a process
//! from `/proc/<pid>/smaps` and `/proc/<pid>/smaps_rollup` files.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Buffer configuration for parsing operations.
#[derive(Debug, Clone, Copy)]
pub struct BufferConfig {
    pub io_kb: usize,
    pub smaps_kb: usize,
    pub smaps_rollup_kb: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            io_kb: 4,
            smaps_kb: 512,
            smaps_rollup_kb: 256,
        }
    }
}

/// Sums `Private_Clean` and `Private_Dirty` over every region listed by a
/// smaps-formatted reader. Returns bytes.
fn sum_private_kb<R: BufRead>(reader: R) -> Result<u64, std::io::Error> {
    let mut private_clean_kb = 0u64;
    let mut private_dirty_kb = 0u64;

    for line in reader.lines() {
        let l = line?;
        if let Some(v) = l.strip_prefix("Private_Clean:") {
            private_clean_kb = private_clean_kb.saturating_add(parse_kb_value(v).unwrap_or(0));
        } else if let Some(v) = l.strip_prefix("Private_Dirty:") {
            private_dirty_kb = private_dirty_kb.saturating_add(parse_kb_value(v).unwrap_or(0));
        }
    }

    Ok(private_clean_kb
        .saturating_add(private_dirty_kb)
        .saturating_mul(1024))
}

/// Fast parser for /proc/<pid>/smaps_rollup (Linux >= 4.14).
/// Much faster than reading the full smaps file.
pub fn parse_smaps_rollup(path: &Path, buf_kb: usize) -> Result<u64, std::io::Error> {
    let file = fs::File::open(path)?;
    sum_private_kb(BufReader::with_capacity(buf_kb.max(1) * 1024, file))
}

/// Parses private memory from the full /proc/<pid>/smaps file.
pub fn parse_smaps(path: &Path, buf_kb: usize) -> Result<u64, std::io::Error> {
    let file = fs::File::open(path)?;
    sum_private_kb(BufReader::with_capacity(buf_kb.max(1) * 1024, file))
}

/// Parses kilobyte values from smaps file lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Wrapper that selects the fastest available memory parser.
/// Uses smaps_rollup when available and preferred, otherwise falls back to full smaps.
pub fn parse_uss_for_process(
    proc_path: &Path,
    buffers: &BufferConfig,
    prefer_rollup: bool,
) -> Result<u64, std::io::Error> {
    if prefer_rollup {
        let rollup = proc_path.join("smaps_rollup");
        if rollup.exists() {
            return parse_smaps_rollup(&rollup, buffers.smaps_rollup_kb);
        }
    }

    let smaps = proc_path.join("smaps");
    parse_smaps(&smaps, buffers.smaps_kb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SMAPS: &str = "\
55d0c0a00000-55d0c0a02000 r--p 00000000 08:01 1234 /usr/bin/worker
Size:                  8 kB
Rss:                   8 kB
Pss:                   4 kB
Shared_Clean:          4 kB
Shared_Dirty:          0 kB
Private_Clean:         4 kB
Private_Dirty:         0 kB
7ffd4a9e0000-7ffd4aa01000 rw-p 00000000 00:00 0 [stack]
Size:                132 kB
Rss:                  12 kB
Pss:                  12 kB
Shared_Clean:          0 kB
Shared_Dirty:          0 kB
Private_Clean:         0 kB
Private_Dirty:        12 kB
";

    #[test]
    fn test_parse_kb_value() {
        assert_eq!(parse_kb_value("       1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("0 kB"), Some(0));
        assert_eq!(parse_kb_value("  42  "), Some(42));
        assert_eq!(parse_kb_value("18446744073709551615"), Some(u64::MAX));
    }

    #[test]
    fn test_parse_kb_value_invalid() {
        assert_eq!(parse_kb_value(""), None);
        assert_eq!(parse_kb_value("   "), None);
        assert_eq!(parse_kb_value("kB"), None);
        assert_eq!(parse_kb_value("-1 kB"), None);
        assert_eq!(parse_kb_value("1.5 kB"), None);
    }

    #[test]
    fn test_parse_smaps_sums_private_regions_only() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("smaps");
        std::fs::write(&path, SMAPS).expect("Failed to write smaps");

        // (4 + 0) + (0 + 12) kB of private memory, shared pages ignored
        assert_eq!(parse_smaps(&path, 4).unwrap(), 16 * 1024);
    }

    #[test]
    fn test_parse_smaps_saturates_on_huge_values() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("smaps");
        std::fs::write(
            &path,
            "Private_Clean: 18446744073709551615 kB\nPrivate_Clean: 5 kB\nPrivate_Dirty: 18446744073709551615 kB\n",
        )
        .expect("Failed to write smaps");

        assert_eq!(parse_smaps(&path, 4).unwrap(), u64::MAX);
    }

    #[test]
    fn test_parse_uss_prefers_rollup() {
        let dir = tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join("smaps"), SMAPS).unwrap();
        std::fs::write(
            dir.path().join("smaps_rollup"),
            "00400000-7fff00000000 ---p 00000000 00:00 0 [rollup]\nRss: 100 kB\nPrivate_Clean: 10 kB\nPrivate_Dirty: 30 kB\n",
        )
        .unwrap();

        let buffers = BufferConfig::default();
        assert_eq!(
            parse_uss_for_process(dir.path(), &buffers, true).unwrap(),
            40 * 1024
        );
        assert_eq!(
            parse_uss_for_process(dir.path(), &buffers, false).unwrap(),
            16 * 1024
        );
    }

    #[test]
    fn test_parse_uss_missing_files() {
        let dir = tempdir().expect("Failed to create temp dir");
        let result = parse_uss_for_process(dir.path(), &BufferConfig::default(), true);
        assert!(result.is_err());
    }
}
