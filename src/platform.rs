use regex::Regex;
use std::sync::OnceLock;

/// Target platform, selecting the shared-object file extension and the
/// filename pattern used when scanning dependency directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// The platform this binary was compiled for. Anything that is not
    /// macOS or Windows is treated as Unix with `.so` objects.
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Platform::Linux => ".so",
            Platform::MacOs => ".dylib",
            Platform::Windows => ".dll",
        }
    }

    /// Platform-qualified file name for a bare library name,
    /// e.g. `eccodes` -> `libeccodes.so`.
    pub fn file_name(self, library: &str) -> String {
        format!("lib{}{}", library, self.extension())
    }

    /// Pattern matching shared-object file names, including the optional
    /// numeric version suffix used on Unix (`libfoo.so.1`).
    pub fn object_pattern(self) -> &'static Regex {
        static SO: OnceLock<Regex> = OnceLock::new();
        static DYLIB: OnceLock<Regex> = OnceLock::new();
        static DLL: OnceLock<Regex> = OnceLock::new();

        let (cell, pattern) = match self {
            Platform::Linux => (&SO, r"\.so(\.[0-9]+)?$"),
            Platform::MacOs => (&DYLIB, r"\.dylib$"),
            Platform::Windows => (&DLL, r"\.dll$"),
        };
        cell.get_or_init(|| Regex::new(pattern).expect("constant pattern"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_prefixed_and_qualified() {
        assert_eq!(Platform::Linux.file_name("eccodes"), "libeccodes.so");
        assert_eq!(Platform::MacOs.file_name("eccodes"), "libeccodes.dylib");
        assert_eq!(Platform::Windows.file_name("eccodes"), "libeccodes.dll");
    }

    #[test]
    fn unix_pattern_accepts_versioned_objects() {
        let pattern = Platform::Linux.object_pattern();
        assert!(pattern.is_match("libfoo.so"));
        assert!(pattern.is_match("libfoo.so.1"));
        assert!(pattern.is_match("libfoo.so.42"));
        assert!(!pattern.is_match("libfoo.so.1.2"));
        assert!(!pattern.is_match("libfoo.a"));
        assert!(!pattern.is_match("libfoo.socket"));
    }

    #[test]
    fn macos_pattern_rejects_versioned_suffix() {
        let pattern = Platform::MacOs.object_pattern();
        assert!(pattern.is_match("libfoo.dylib"));
        assert!(!pattern.is_match("libfoo.dylib.1"));
    }
}
