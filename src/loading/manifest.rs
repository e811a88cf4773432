//! Dependency manifests.
//!
//! A module file `dir/<stem>.<ext>` may ship `dir/<stem>.deps.json`:
//!
//! ```json
//! {
//!   "dependencies": [
//!     { "name": "orders" },
//!     { "name": "mylib", "path": "lib/mylib.bin" },
//!     { "name": "native-queue", "runtimes": ["linux-x64", "win"] }
//!   ]
//! }
//! ```
//!
//! A missing manifest means the module has no dependencies.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::loading::ModuleLoadError;

pub const MANIFEST_SUFFIX: &str = ".deps.json";

/// Declared runtime dependencies of a module.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ModuleManifest {
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

/// One dependency entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DependencyEntry {
    pub name: String,

    /// File path, relative to the entry module's directory or a shared
    /// library search path. Defaults to `<name>` plus the entry module's
    /// extension.
    #[serde(default)]
    pub path: Option<String>,

    /// Runtime identifiers this dependency applies to. Empty means all.
    #[serde(default)]
    pub runtimes: Vec<String>,
}

impl DependencyEntry {
    pub fn supports(&self, runtime: &RuntimeIdentifier) -> bool {
        self.runtimes.is_empty() || self.runtimes.iter().any(|r| runtime.matches(r))
    }

    /// File name to look for, given the entry module's extension.
    pub fn file_name(&self, extension: Option<&str>) -> PathBuf {
        match (&self.path, extension) {
            (Some(path), _) => PathBuf::from(path),
            (None, Some(ext)) => PathBuf::from(format!("{}.{}", self.name, ext)),
            (None, None) => PathBuf::from(&self.name),
        }
    }
}

impl ModuleManifest {
    /// Manifest location for a module file.
    pub fn manifest_path(module_path: &Path) -> PathBuf {
        let stem = module_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        module_path.with_file_name(format!("{}{}", stem, MANIFEST_SUFFIX))
    }

    /// Load the manifest next to `module_path`. A missing file is an empty manifest.
    pub fn load(module_path: &Path) -> Result<Self, ModuleLoadError> {
        let path = Self::manifest_path(module_path);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No dependency manifest");
                return Ok(Self::default());
            }
            Err(source) => return Err(ModuleLoadError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| ModuleLoadError::Manifest { path, source })
    }

    /// Dependencies that apply to `runtime`, in declaration order.
    pub fn runtime_dependencies<'a>(
        &'a self,
        runtime: &'a RuntimeIdentifier,
    ) -> impl Iterator<Item = &'a DependencyEntry> + 'a {
        self.dependencies.iter().filter(move |d| d.supports(runtime))
    }
}

/// `<os>-<arch>` identifier of the running platform, e.g. `linux-x64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeIdentifier {
    os: String,
    arch: String,
}

impl RuntimeIdentifier {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into().to_lowercase(),
            arch: arch.into().to_lowercase(),
        }
    }

    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "osx",
            "windows" => "win",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "x64",
            "aarch64" => "arm64",
            other => other,
        };
        Self::new(os, arch)
    }

    /// True for the full identifier or the bare OS family.
    pub fn matches(&self, identifier: &str) -> bool {
        let identifier = identifier.trim().to_lowercase();
        identifier == self.os || identifier == self.to_string()
    }
}

impl fmt::Display for RuntimeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
