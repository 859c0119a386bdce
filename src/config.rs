//! User config file handling.
//!
//! An optional INI-style file contributes extra search roots. Exactly one of
//! two locations may exist: `~/.config/findlibs/findlibs.conf` or
//! `~/.findlibs`. The keys of its `Paths` section are directories to probe;
//! values, if any, are ignored.

use crate::error::Error;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::fs;

const CANDIDATES: [&str; 2] = [".config/findlibs/findlibs.conf", ".findlibs"];

pub(crate) fn home_dir() -> Option<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(dirs::home_dir()?).ok()
}

pub(crate) fn expand_tilde(path: &str, home: &Utf8Path) -> Utf8PathBuf {
    if path == "~" {
        home.to_owned()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        Utf8PathBuf::from(path)
    }
}

/// `~`-expansion against the current user's home. Paths without a leading
/// tilde, and paths of users without a home directory, pass through verbatim.
pub(crate) fn expand_user(path: &str) -> Utf8PathBuf {
    match home_dir() {
        Some(home) => expand_tilde(path, &home),
        None => Utf8PathBuf::from(path),
    }
}

/// Returns the search roots contributed by the user's config file, an empty
/// set when no config file is present.
pub fn search_roots() -> Result<BTreeSet<Utf8PathBuf>, Error> {
    match home_dir() {
        Some(home) => search_roots_under(&home),
        None => Ok(BTreeSet::new()),
    }
}

pub(crate) fn search_roots_under(home: &Utf8Path) -> Result<BTreeSet<Utf8PathBuf>, Error> {
    let present: Vec<Utf8PathBuf> = CANDIDATES
        .iter()
        .map(|candidate| home.join(candidate))
        .filter(|path| path.exists())
        .collect();

    if present.len() > 1 {
        return Err(Error::MultipleConfigFiles(present));
    }
    let Some(file) = present.into_iter().next() else {
        return Ok(BTreeSet::new());
    };

    let content = fs::read_to_string(&file)?;
    parse_search_roots(&content, &file, home)
}

fn parse_search_roots(
    content: &str,
    file: &Utf8Path,
    home: &Utf8Path,
) -> Result<BTreeSet<Utf8PathBuf>, Error> {
    let mut roots = BTreeSet::new();
    let mut in_paths = false;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_paths = line == "[Paths]";
            continue;
        }

        if !in_paths {
            continue;
        }

        // Keys may carry a value after `=` or `:`; the value is ignored.
        // Key casing is preserved verbatim.
        let key = line.split(['=', ':']).next().unwrap_or(line).trim();
        if key.is_empty() {
            continue;
        }

        // $HOME is substituted before tilde expansion.
        roots.insert(expand_tilde(&key.replace("$HOME", "~"), home));
    }

    let relative: Vec<Utf8PathBuf> = roots
        .iter()
        .filter(|path| !path.is_absolute())
        .cloned()
        .collect();
    if !relative.is_empty() {
        return Err(Error::RelativeConfigPaths {
            file: file.to_owned(),
            paths: relative,
        });
    }

    let non_directories: Vec<Utf8PathBuf> = roots
        .iter()
        .filter(|path| !path.is_dir())
        .cloned()
        .collect();
    if !non_directories.is_empty() {
        return Err(Error::ConfigEntriesNotDirectories {
            file: file.to_owned(),
            paths: non_directories,
        });
    }

    Ok(roots)
}
