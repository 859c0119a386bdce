// findlibs - native shared library resolution
// Apache-2.0, 2025

//! Locates native shared libraries across heterogeneous installation
//! environments and optionally loads them into the process's global symbol
//! namespace.
//!
//! No single mechanism reliably finds a native library across virtual
//! environments, conda installs, system packages and user overrides; this
//! crate stitches several partial mechanisms into one deterministic,
//! overridable precedence chain. Sources are consulted in a fixed order —
//! installed package, environment prefix, per-package home variables, user
//! config file, linker path variables, system directories, linker cache —
//! and the first hit wins. Each source can be switched off through
//! `FINDLIBS_DISABLE_<ID>=yes`.
//!
//! # Example: find a library
//!
//! ```no_run
//! if let Some(path) = findlibs::find("eccodes", None)? {
//!     println!("{path}");
//! }
//! # Ok::<(), findlibs::Error>(())
//! ```
//!
//! # Example: load with a package provider
//!
//! ```no_run
//! use findlibs::{DirectoryProvider, LibraryRequest, PackageProvider, Resolver};
//!
//! let provider = DirectoryProvider::new(vec!["/opt/stack".into()]);
//! let resolver = Resolver::builder()
//!     .packages(Box::new(provider) as Box<dyn PackageProvider>)
//!     .build();
//! let handle = resolver.load(&LibraryRequest::new("odc", None))?;
//! # Ok::<(), findlibs::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod package;
pub mod platform;
pub mod resolver;

mod ldcache;
mod preload;
mod sources;

pub use error::Error;
pub use loader::load_globally;
pub use package::{DirectoryProvider, PackageProvider, ResolvedPackage};
pub use platform::Platform;
pub use preload::preload_dependencies;
pub use resolver::{LibraryRequest, Resolver};
pub use sources::Source;

// The opaque handle returned by load operations.
pub use libloading::Library;

use camino::Utf8PathBuf;

/// Returns the path of `library`, searching every enabled source in order,
/// or `None` when no source has it. `package` defaults to `<library>lib`.
pub fn find(library: &str, package: Option<&str>) -> Result<Option<Utf8PathBuf>, Error> {
    Resolver::new().find(&LibraryRequest::new(library, package))
}

/// Finds `library` and loads it globally right away, dependencies included.
/// Fails with [`Error::NotFound`] when no enabled source has it.
pub fn load(library: &str, package: Option<&str>) -> Result<Library, Error> {
    Resolver::new().load(&LibraryRequest::new(library, package))
}
