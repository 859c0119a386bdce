//! Transitive preload of declared native dependencies.
//!
//! A shared object shipped by a package may require its own dependencies to
//! be resolvable by the dynamic linker at load time, so every dependency's
//! objects are loaded globally before the objects of the package declaring
//! it. Traversal is depth-first with an explicit visited set, so each
//! package is expanded at most once per call and declaration cycles
//! terminate.

use crate::loader;
use crate::package::{PackageProvider, ResolvedPackage};
use crate::platform::Platform;
use crate::sources::LIB_DIRS;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use std::fs;
use tracing::{debug, warn};

/// Globally loads the native objects of every package `package` transitively
/// declares, dependencies before dependents. Missing declared packages and
/// objects that fail to load are warnings, never errors.
pub fn preload_dependencies(
    provider: &dyn PackageProvider,
    package: &ResolvedPackage,
    platform: Platform,
) {
    for path in preload_plan(provider, package, platform) {
        debug!("preloading {path}");
        if let Err(err) = loader::load_resident(&path) {
            warn!("failed to preload {path}: {err}");
        }
    }
}

/// The objects to load, in load order. Within one directory the order is
/// whatever the filesystem lists; across packages dependencies always come
/// before their dependents.
pub(crate) fn preload_plan(
    provider: &dyn PackageProvider,
    package: &ResolvedPackage,
    platform: Platform,
) -> Vec<Utf8PathBuf> {
    let mut plan = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(package.name.clone());
    expand(provider, package, platform, &mut visited, &mut plan);
    plan
}

fn expand(
    provider: &dyn PackageProvider,
    package: &ResolvedPackage,
    platform: Platform,
    visited: &mut HashSet<String>,
    plan: &mut Vec<Utf8PathBuf>,
) {
    for dependency in &package.dependencies {
        if !visited.insert(dependency.clone()) {
            continue;
        }
        debug!("considering transitive dependency preload of {dependency}");
        match provider.resolve(dependency) {
            Some(resolved) => {
                // Recurse first: the dependency's own dependencies must be
                // in place before its objects are opened.
                expand(provider, &resolved, platform, visited, plan);
                for lib in LIB_DIRS {
                    let dir = resolved.root.join(lib);
                    if dir.exists() {
                        collect_objects(&dir, platform, plan);
                    }
                }
            }
            None => warn!(
                "unable to resolve {dependency}, declared as dependency of {}",
                package.name
            ),
        }
    }
}

fn collect_objects(dir: &Utf8Path, platform: Platform, plan: &mut Vec<Utf8PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if platform.object_pattern().is_match(&name) {
            plan.push(dir.join(name));
        }
    }
}
