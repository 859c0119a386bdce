//! Linker cache lookup, the last-resort search strategy.
//!
//! Reads the glibc new-format `ld.so.cache` and scans it for a soname. This
//! mirrors what `ctypes.util.find_library` style helpers do and inherits
//! their caveat: the cache stores whatever the system's ldconfig recorded,
//! so the returned value is best-effort and not re-checked against the
//! filesystem.

use camino::Utf8PathBuf;
use std::fs;
use std::path::Path;

const CACHE_MAGIC: [u8; 20] = *b"glibc-ld.so.cache1.1";
// 20 (magic) + 4 (nlibs) + 4 (len_strings) + 16 (unused)
const HEADER_SIZE: usize = 44;
// flags + key + value + osversion (4 bytes each) + hwcap (8 bytes)
const ENTRY_SIZE: usize = 24;

pub(crate) const HOST_CACHE: &str = "/etc/ld.so.cache";

/// Looks a bare library name up in the cache at `path`, returning the stored
/// path of the first entry whose soname matches `lib<name>.<version>`.
pub(crate) fn find_library(path: &Path, name: &str) -> Option<Utf8PathBuf> {
    let data = fs::read(path).ok()?;
    lookup(&data, name)
}

pub(crate) fn lookup(data: &[u8], name: &str) -> Option<Utf8PathBuf> {
    if data.len() < HEADER_SIZE || data[..20] != CACHE_MAGIC {
        return None;
    }

    let nlibs = u32::from_le_bytes(data[20..24].try_into().ok()?) as usize;
    let table_start = HEADER_SIZE + nlibs.checked_mul(ENTRY_SIZE)?;
    if table_start > data.len() {
        return None;
    }

    let prefix = format!("lib{}.", name);
    for i in 0..nlibs {
        let offset = HEADER_SIZE + i * ENTRY_SIZE;
        let key_offset = read_u32(data, offset + 4)? as usize;
        let value_offset = read_u32(data, offset + 8)? as usize;

        let Some(key) = string_at(data, table_start, key_offset) else {
            continue;
        };
        if key.starts_with(&prefix) {
            return string_at(data, table_start, value_offset).map(Utf8PathBuf::from);
        }
    }
    None
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    Some(u32::from_le_bytes(data.get(offset..offset + 4)?.try_into().ok()?))
}

// Offsets are file-relative in caches written by glibc's ldconfig and
// table-relative in some other writers; anything below the table start is
// taken as table-relative.
fn string_at(data: &[u8], table_start: usize, offset: usize) -> Option<&str> {
    let at = if offset >= table_start {
        offset
    } else {
        table_start + offset
    };
    let tail = data.get(at..)?;
    let end = tail.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&tail[..end]).ok()
}

/// Builds a minimal new-format cache with table-relative string offsets,
/// for tests elsewhere in the crate too.
#[cfg(test)]
pub(crate) fn build_test_cache(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut strings = Vec::new();
    let mut offsets = Vec::new();
    for (key, value) in entries {
        let mut add = |s: &str| {
            let offset = strings.len() as u32;
            strings.extend_from_slice(s.as_bytes());
            strings.push(0);
            offset
        };
        offsets.push((add(key), add(value)));
    }

    let mut data = Vec::new();
    data.extend_from_slice(&CACHE_MAGIC);
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    data.extend_from_slice(&(strings.len() as u32).to_le_bytes());
    data.extend_from_slice(&[0u8; 16]);
    for (key_offset, value_offset) in offsets {
        data.extend_from_slice(&0u32.to_le_bytes()); // flags
        data.extend_from_slice(&key_offset.to_le_bytes());
        data.extend_from_slice(&value_offset.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes()); // osversion
        data.extend_from_slice(&0u64.to_le_bytes()); // hwcap
    }
    data.extend_from_slice(&strings);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_cache(entries: &[(&str, &str)]) -> Vec<u8> {
        build_test_cache(entries)
    }

    #[test]
    fn finds_versioned_soname() {
        let data = build_cache(&[
            ("libabc.so.6", "/fake/lib/libabc.so.6"),
            ("libeccodes.so.1", "/fake/lib/libeccodes.so.1"),
        ]);
        assert_eq!(
            lookup(&data, "eccodes").unwrap(),
            Utf8PathBuf::from("/fake/lib/libeccodes.so.1")
        );
    }

    #[test]
    fn name_must_match_a_full_component() {
        let data = build_cache(&[("libeccodes.so.1", "/fake/lib/libeccodes.so.1")]);
        assert!(lookup(&data, "ecc").is_none());
    }

    #[test]
    fn rejects_foreign_or_truncated_data() {
        assert!(lookup(b"not a cache", "eccodes").is_none());

        let mut data = build_cache(&[("libx.so.1", "/fake/libx.so.1")]);
        data.truncate(HEADER_SIZE - 1);
        assert!(lookup(&data, "x").is_none());
    }
}
