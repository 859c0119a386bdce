// Error types for findlibs
use camino::Utf8PathBuf;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unable to find {library} (package {package})")]
    NotFound { library: String, package: String },

    #[error("multiple config files present, delete all but one of: {0:?}")]
    MultipleConfigFiles(Vec<Utf8PathBuf>),

    #[error("relative paths are not allowed in {file}, offending entries: {paths:?}")]
    RelativeConfigPaths {
        file: Utf8PathBuf,
        paths: Vec<Utf8PathBuf>,
    },

    #[error("entries in {file} must be directories, offending entries: {paths:?}")]
    ConfigEntriesNotDirectories {
        file: Utf8PathBuf,
        paths: Vec<Utf8PathBuf>,
    },

    #[error("failed to load {path}: {source}")]
    Load {
        path: Utf8PathBuf,
        #[source]
        source: libloading::Error,
    },
}
