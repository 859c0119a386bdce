//! Ordered multi-source resolution.
//!
//! The resolver consults a fixed, ordered list of sources and returns the
//! first hit. Individual sources can be switched off through their
//! `FINDLIBS_DISABLE_<ID>` environment variable; disabled sources are
//! skipped entirely. Nothing is cached: every call reflects the current
//! state of the filesystem and environment.

use crate::error::Error;
use crate::loader;
use crate::package::PackageProvider;
use crate::platform::Platform;
use crate::preload;
use crate::sources::{self, Source, SOURCES};
use bon::Builder;
use camino::Utf8PathBuf;
use libloading::Library;
use tracing::debug;

/// One library lookup: the library name without its `lib` prefix, and the
/// package expected to ship it.
#[derive(Debug, Clone)]
pub struct LibraryRequest {
    pub library: String,
    pub package: String,
}

impl LibraryRequest {
    /// The package name defaults to `<library>lib`, the convention used by
    /// binary wheels exposing native libraries (`eccodes` -> `eccodeslib`).
    pub fn new(library: &str, package: Option<&str>) -> Self {
        Self {
            library: library.to_string(),
            package: package
                .map(str::to_string)
                .unwrap_or_else(|| format!("{library}lib")),
        }
    }
}

/// Resolves libraries against the ordered source list, optionally loading
/// them and their declared dependencies globally.
#[derive(Builder)]
pub struct Resolver {
    /// Oracle mapping package names to their installations; without one the
    /// package source never contributes a path.
    packages: Option<Box<dyn PackageProvider>>,
    /// Preload declared native dependencies when loading through the package
    /// source. Defaults to on everywhere except macOS, where globally loaded
    /// symbols do not reliably become visible.
    preload: Option<bool>,
    #[builder(default = Platform::host())]
    platform: Platform,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path of the requested library, or `None` when no enabled
    /// source has it. Fails only on configuration errors.
    pub fn find(&self, request: &LibraryRequest) -> Result<Option<Utf8PathBuf>, Error> {
        Ok(self.resolve(request)?.map(|(_, path)| path))
    }

    /// Resolves and globally loads the requested library. When it came from
    /// the package source, the package's declared dependencies are loaded
    /// first so their symbols are already resolvable.
    pub fn load(&self, request: &LibraryRequest) -> Result<Library, Error> {
        let Some((source, path)) = self.resolve(request)? else {
            return Err(Error::NotFound {
                library: request.library.clone(),
                package: request.package.clone(),
            });
        };

        if source == Source::Package && self.preload_enabled() {
            if let Some(provider) = self.packages.as_deref() {
                if let Some(package) = provider.resolve(&request.package) {
                    preload::preload_dependencies(provider, &package, self.platform);
                }
            }
        }

        loader::load_globally(&path)
    }

    pub(crate) fn resolve(
        &self,
        request: &LibraryRequest,
    ) -> Result<Option<(Source, Utf8PathBuf)>, Error> {
        let filename = self.platform.file_name(&request.library);

        for source in SOURCES {
            if source.disabled() {
                continue;
            }
            debug!(
                "about to search for {}/{} in {}",
                filename,
                request.package,
                source.id()
            );
            let hit = match source {
                Source::Package => sources::find_in_package(
                    self.packages.as_deref(),
                    &request.package,
                    &filename,
                ),
                Source::Python => sources::find_in_python(&filename),
                Source::Home => sources::find_in_home(&request.package, &filename),
                Source::ConfigPaths => sources::find_in_config_paths(&filename)?,
                Source::LdPath => sources::find_in_ld_path(&filename),
                Source::Sys => sources::find_in_sys(&filename),
                Source::CtypesUtil => sources::find_in_ldcache(&filename),
            };
            if let Some(path) = hit {
                debug!("found {} in {}", path, source.id());
                return Ok(Some((source, path)));
            }
        }
        Ok(None)
    }

    fn preload_enabled(&self) -> bool {
        self.preload.unwrap_or(self.platform != Platform::MacOs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DirectoryProvider;
    use std::env;
    use std::fs;
    use std::sync::Mutex;

    // Tests below mutate the process environment and must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Restores every touched variable on drop.
    struct EnvGuard {
        saved: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let mut guard = Self { saved: Vec::new() };
            // Keep ambient prefixes from shadowing per-test locations.
            for name in ["VIRTUAL_ENV", "CONDA_PREFIX", "LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"] {
                guard.unset(name);
            }
            guard
        }

        fn set(&mut self, name: &str, value: &str) {
            self.save(name);
            env::set_var(name, value);
        }

        fn unset(&mut self, name: &str) {
            self.save(name);
            env::remove_var(name);
        }

        fn save(&mut self, name: &str) {
            self.saved.push((name.to_string(), env::var(name).ok()));
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in self.saved.drain(..).rev() {
                match value {
                    Some(value) => env::set_var(&name, value),
                    None => env::remove_var(&name),
                }
            }
        }
    }

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn place_library(root: &camino::Utf8Path, lib: &str, library: &str) -> Utf8PathBuf {
        let dir = root.join(lib);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(Platform::host().file_name(library));
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn default_package_name_appends_lib() {
        let request = LibraryRequest::new("eccodes", None);
        assert_eq!(request.package, "eccodeslib");

        let request = LibraryRequest::new("odc", Some("pyodc"));
        assert_eq!(request.package, "pyodc");
    }

    #[test]
    fn home_variable_resolves_the_library() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        let home = tempfile::tempdir().unwrap();
        let home = utf8(home.path());
        let expected = place_library(&home, "lib", "eccodes");
        env.set("ECCODES_HOME", home.as_str());

        let resolver = Resolver::new();
        let found = resolver
            .find(&LibraryRequest::new("eccodes", None))
            .unwrap();
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn ld_library_path_segments_are_probed_left_to_right() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let filename = Platform::host().file_name("zzfindlibsx");
        let expected = utf8(b.path()).join(&filename);
        fs::write(&expected, b"").unwrap();

        let joined = env::join_paths([a.path(), b.path()]).unwrap();
        env.set("LD_LIBRARY_PATH", joined.to_str().unwrap());

        let resolver = Resolver::new();
        let found = resolver
            .find(&LibraryRequest::new("zzfindlibsx", None))
            .unwrap();
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn disabling_a_source_hides_its_location() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        let home = tempfile::tempdir().unwrap();
        let home = utf8(home.path());
        place_library(&home, "lib", "zzfindlibsy");
        env.set("ZZFINDLIBSY_HOME", home.as_str());
        env.set("FINDLIBS_DISABLE_HOME", "yes");

        let resolver = Resolver::new();
        let found = resolver
            .find(&LibraryRequest::new("zzfindlibsy", None))
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn a_switch_value_other_than_yes_leaves_the_source_enabled() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        let home = tempfile::tempdir().unwrap();
        let home = utf8(home.path());
        let expected = place_library(&home, "lib64", "zzfindlibsy");
        env.set("ZZFINDLIBSY_HOME", home.as_str());
        env.set("FINDLIBS_DISABLE_HOME", "no");

        let resolver = Resolver::new();
        let found = resolver
            .find(&LibraryRequest::new("zzfindlibsy", None))
            .unwrap();
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn earlier_sources_shadow_later_matches() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        let home = tempfile::tempdir().unwrap();
        let home = utf8(home.path());
        let from_home = place_library(&home, "lib", "zzfindlibsz");

        let ld_dir = tempfile::tempdir().unwrap();
        let filename = Platform::host().file_name("zzfindlibsz");
        fs::write(ld_dir.path().join(&filename), b"").unwrap();

        env.set("ZZFINDLIBSZ_HOME", home.as_str());
        env.set("LD_LIBRARY_PATH", ld_dir.path().to_str().unwrap());

        let resolver = Resolver::new();
        let found = resolver
            .find(&LibraryRequest::new("zzfindlibsz", None))
            .unwrap();
        assert_eq!(found, Some(from_home));
    }

    #[test]
    fn package_source_wins_over_home() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();

        let packages = tempfile::tempdir().unwrap();
        let packages = utf8(packages.path());
        let expected = place_library(&packages.join("zzfindlibsplib"), "lib", "zzfindlibsp");

        let home = tempfile::tempdir().unwrap();
        let home = utf8(home.path());
        place_library(&home, "lib", "zzfindlibsp");
        env.set("ZZFINDLIBSP_HOME", home.as_str());

        let resolver = Resolver::builder()
            .packages(Box::new(DirectoryProvider::new(vec![packages])) as Box<dyn PackageProvider>)
            .build();

        let request = LibraryRequest::new("zzfindlibsp", None);
        let (source, path) = resolver.resolve(&request).unwrap().unwrap();
        assert_eq!(source, Source::Package);
        assert_eq!(path, expected);
    }

    #[test]
    fn load_escalates_not_found() {
        let _lock = env_lock();
        let _env = EnvGuard::new();

        let resolver = Resolver::new();
        match resolver.load(&LibraryRequest::new("zzfindlibsabsent", None)) {
            Err(Error::NotFound { library, package }) => {
                assert_eq!(library, "zzfindlibsabsent");
                assert_eq!(package, "zzfindlibsabsentlib");
            }
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }
}
