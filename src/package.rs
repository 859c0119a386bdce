//! Package resolution oracle.
//!
//! Resolving an importable package name to its installation directory is
//! host-specific, so the resolver only talks to the [`PackageProvider`] seam.
//! [`DirectoryProvider`] is the shipping implementation: packages are plain
//! directories under a fixed list of roots, and their native dependencies are
//! declared in a `findlibs-dependencies` file.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File in a package directory listing the packages whose native objects
/// must be loaded first, one name per line.
pub const DEPENDENCIES_FILE: &str = "findlibs-dependencies";

/// A package resolved to its installation directory, together with the
/// packages it declares as native dependencies.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub name: String,
    pub root: Utf8PathBuf,
    pub dependencies: Vec<String>,
}

/// Maps an importable package name to its installation on disk.
///
/// An unresolvable name is `None`, never an error: a missing package only
/// means the package source cannot contribute a path.
pub trait PackageProvider {
    fn resolve(&self, name: &str) -> Option<ResolvedPackage>;
}

/// Resolves packages as directories under a fixed list of roots, first root
/// wins.
#[derive(Debug, Clone, Default)]
pub struct DirectoryProvider {
    roots: Vec<Utf8PathBuf>,
}

impl DirectoryProvider {
    pub fn new(roots: Vec<Utf8PathBuf>) -> Self {
        Self { roots }
    }
}

impl PackageProvider for DirectoryProvider {
    fn resolve(&self, name: &str) -> Option<ResolvedPackage> {
        for root in &self.roots {
            let dir = root.join(name);
            if dir.is_dir() {
                return Some(ResolvedPackage {
                    name: name.to_string(),
                    dependencies: read_dependencies(&dir),
                    root: dir,
                });
            }
        }
        None
    }
}

fn read_dependencies(dir: &Utf8Path) -> Vec<String> {
    let Ok(content) = fs::read_to_string(dir.join(DEPENDENCIES_FILE)) else {
        return Vec::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
