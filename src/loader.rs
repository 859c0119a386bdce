//! The global-load primitive.
//!
//! Loading is delegated to the OS dynamic linker; on Unix objects are opened
//! with `RTLD_NOW | RTLD_GLOBAL` so their symbols are visible to everything
//! loaded afterwards. Nothing is tracked crate-side: the linker's own
//! process-wide registry is the only record of what has been loaded.

use crate::error::Error;
use camino::Utf8Path;
use libloading::Library;

/// Loads the shared object at `path` into the process's global namespace.
///
/// Dropping the returned [`Library`] unloads the object; callers that need
/// it resident for the process lifetime should leak the handle.
///
/// # Safety
///
/// Wraps `dlopen`; initialisers in the loaded object run arbitrary code.
/// The usual `libloading` caveats apply.
pub fn load_globally(path: &Utf8Path) -> Result<Library, Error> {
    let loaded = {
        #[cfg(unix)]
        {
            use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
            unsafe { UnixLibrary::open(Some(path.as_std_path()), RTLD_NOW | RTLD_GLOBAL) }
                .map(Library::from)
        }
        #[cfg(not(unix))]
        {
            unsafe { Library::new(path.as_std_path()) }
        }
    };
    loaded.map_err(|source| Error::Load {
        path: path.to_owned(),
        source,
    })
}

/// Like [`load_globally`] but leaks the handle so the object stays resident.
pub(crate) fn load_resident(path: &Utf8Path) -> Result<(), Error> {
    let library = load_globally(path)?;
    std::mem::forget(library);
    Ok(())
}
