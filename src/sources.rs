//! The individual search strategies consulted by the resolver.
//!
//! Each source maps a platform-qualified file name (and the owning package
//! name, where relevant) to an optional path, consulting one provenance:
//! installed packages, environment prefixes, per-package home variables, the
//! user config file, linker path variables, fixed system roots, or the
//! linker cache as a last resort.

use crate::config;
use crate::error::Error;
use crate::ldcache;
use crate::package::PackageProvider;
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::path::Path;

/// Subdirectories probed beneath every search root, in this order.
pub(crate) const LIB_DIRS: [&str; 2] = ["lib", "lib64"];

const SYS_ROOTS: [&str; 6] = [
    "/",
    "/usr/",
    "/usr/local/",
    "/opt/",
    "/opt/homebrew/",
    "~/.local",
];

/// One search strategy, identified by the id used in its
/// `FINDLIBS_DISABLE_<ID>` switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Package,
    Python,
    Home,
    ConfigPaths,
    LdPath,
    Sys,
    CtypesUtil,
}

/// Consultation order. A hit at position `k` is never shadowed by a later
/// source; this ordering is a hard contract.
pub(crate) const SOURCES: [Source; 7] = [
    Source::Package,
    Source::Python,
    Source::Home,
    Source::ConfigPaths,
    Source::LdPath,
    Source::Sys,
    Source::CtypesUtil,
];

impl Source {
    pub fn id(self) -> &'static str {
        match self {
            Source::Package => "PACKAGE",
            Source::Python => "PYTHON",
            Source::Home => "HOME",
            Source::ConfigPaths => "CONFIG_PATHS",
            Source::LdPath => "LD_PATH",
            Source::Sys => "SYS",
            Source::CtypesUtil => "CTYPES_UTIL",
        }
    }

    /// A source is skipped entirely when its switch is set to `"yes"`;
    /// any other value, or no value, leaves it enabled.
    pub(crate) fn disabled(self) -> bool {
        env::var(format!("FINDLIBS_DISABLE_{}", self.id()))
            .map(|value| value == "yes")
            .unwrap_or(false)
    }
}

/// Probes `lib` then `lib64` under `root` for `filename`.
pub(crate) fn find_under_root(root: &Utf8Path, filename: &str) -> Option<Utf8PathBuf> {
    for lib in LIB_DIRS {
        let candidate = root.join(lib).join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

pub(crate) fn find_in_package(
    provider: Option<&dyn PackageProvider>,
    package: &str,
    filename: &str,
) -> Option<Utf8PathBuf> {
    let resolved = provider?.resolve(package)?;
    find_under_root(&resolved.root, filename)
}

/// Interpreter/environment prefix: an active virtual environment if any,
/// otherwise the prefix this binary is installed under, then a conda prefix.
pub(crate) fn find_in_python(filename: &str) -> Option<Utf8PathBuf> {
    let mut roots = Vec::new();
    if let Ok(venv) = env::var("VIRTUAL_ENV") {
        roots.push(Utf8PathBuf::from(venv));
    } else if let Some(prefix) = exe_prefix() {
        roots.push(prefix);
    }
    if let Ok(conda) = env::var("CONDA_PREFIX") {
        roots.push(Utf8PathBuf::from(conda));
    }
    roots
        .iter()
        .find_map(|root| find_under_root(root, filename))
}

// <prefix>/bin/<exe> -> <prefix>
fn exe_prefix() -> Option<Utf8PathBuf> {
    let exe = Utf8PathBuf::from_path_buf(env::current_exe().ok()?).ok()?;
    Some(exe.parent()?.parent()?.to_owned())
}

/// Environment variable names probed for a package's home directory:
/// `{UPPER,lower}_{HOME,DIR}`, doubled with the `lib` suffix stripped when
/// the package name carries one (`eccodeslib` also probes `ECCODES_HOME`).
pub(crate) fn home_env_candidates(package: &str) -> Vec<String> {
    let mut prefixes = vec![package.to_uppercase(), package.to_lowercase()];
    if let Some(stripped) = package.strip_suffix("lib") {
        prefixes.push(stripped.to_uppercase());
        prefixes.push(stripped.to_lowercase());
    }

    let mut names = Vec::new();
    for prefix in &prefixes {
        for suffix in ["HOME", "DIR"] {
            names.push(format!("{}_{}", prefix, suffix));
        }
    }
    names
}

pub(crate) fn find_in_home(package: &str, filename: &str) -> Option<Utf8PathBuf> {
    for name in home_env_candidates(package) {
        if let Ok(value) = env::var(&name) {
            let root = config::expand_user(&value);
            if let Some(hit) = find_under_root(&root, filename) {
                return Some(hit);
            }
        }
    }
    None
}

pub(crate) fn find_in_config_paths(filename: &str) -> Result<Option<Utf8PathBuf>, Error> {
    for root in config::search_roots()? {
        if let Some(hit) = find_under_root(&root, filename) {
            return Ok(Some(hit));
        }
    }
    Ok(None)
}

/// Linker path variables; the filename is probed directly under each
/// segment, with no `lib`/`lib64` appended.
pub(crate) fn find_in_ld_path(filename: &str) -> Option<Utf8PathBuf> {
    for variable in ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"] {
        let Ok(value) = env::var(variable) else {
            continue;
        };
        for segment in env::split_paths(&value) {
            let Ok(segment) = Utf8PathBuf::try_from(segment) else {
                continue;
            };
            let candidate = segment.join(filename);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

pub(crate) fn find_in_sys(filename: &str) -> Option<Utf8PathBuf> {
    for root in SYS_ROOTS {
        let root = config::expand_user(root);
        if let Some(hit) = find_under_root(&root, filename) {
            return Some(hit);
        }
    }
    None
}

/// Last resort: scan the linker cache for the qualified name, retrying with
/// a literal `lib` prefix stripped. The result is returned unverified and
/// may not be usable as a full path.
pub(crate) fn find_in_ldcache(filename: &str) -> Option<Utf8PathBuf> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    find_in_ldcache_at(Path::new(ldcache::HOST_CACHE), filename)
}

pub(crate) fn find_in_ldcache_at(cache: &Path, filename: &str) -> Option<Utf8PathBuf> {
    ldcache::find_library(cache, filename).or_else(|| {
        filename
            .strip_prefix("lib")
            .and_then(|stripped| ldcache::find_library(cache, stripped))
    })
}
