//! Configuration file naming conventions.
//!
//! # Layout
//! ```text
//! <component dir>/
//!     appsettings.json                 base, optional
//!     appsettings.<env>.json           environment, optional
//!     appsettings.<env>.local.json     local override, optional
//!     values.json                      template values, optional
//!
//! <shared library dir>/
//!     <lib>.settings.json              placed under shared-libraries:<lib>
//! ```
//!
//! Shared-library files merge right after the host defaults, so every
//! `appsettings*.json` file overrides them.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::loader::ConfigError;

pub const BASE_FILE_STEM: &str = "appsettings";
pub const TEMPLATE_VALUES_FILE: &str = "values.json";
pub const SHARED_LIBRARY_FILE_SUFFIX: &str = ".settings.json";

/// The ordered set of configuration files for one environment.
#[derive(Debug, Clone)]
pub struct ConfigFileSet {
    environment: Option<String>,
    base_path: PathBuf,
}

impl ConfigFileSet {
    pub fn new(environment: Option<&str>, base_path: impl Into<PathBuf>) -> Self {
        let environment = environment
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        Self {
            environment,
            base_path: base_path.into(),
        }
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    /// Base file.
    pub fn base_file(&self) -> PathBuf {
        self.base_path.join(format!("{}.json", BASE_FILE_STEM))
    }

    /// Files layered over the base file, lowest precedence first.
    pub fn environment_files(&self) -> Vec<PathBuf> {
        match &self.environment {
            Some(env) => vec![
                self.base_path.join(format!("{}.{}.json", BASE_FILE_STEM, env)),
                self.base_path.join(format!("{}.{}.local.json", BASE_FILE_STEM, env)),
            ],
            None => Vec::new(),
        }
    }

    /// Every configuration file, lowest precedence first.
    pub fn enumerate(&self) -> Vec<PathBuf> {
        std::iter::once(self.base_file())
            .chain(self.environment_files())
            .collect()
    }

    pub fn template_values_file(&self) -> PathBuf {
        self.base_path.join(TEMPLATE_VALUES_FILE)
    }
}

/// A configuration file shipped with a shared library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedLibraryFile {
    /// Lower-cased library name taken from the file name.
    pub library: String,
    pub path: PathBuf,
}

/// Find `<lib>.settings.json` files directly inside each search path.
///
/// Paths are visited in order; files within one directory are sorted by
/// library name. Directories that do not exist are skipped.
pub fn shared_library_files(search_paths: &[PathBuf]) -> Result<Vec<SharedLibraryFile>, ConfigError> {
    let mut found = Vec::new();
    for dir in search_paths {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %dir.display(), "Shared library path does not exist");
                continue;
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: dir.clone(),
                    source,
                })
            }
        };

        let mut in_dir = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(library) = library_name(&path) {
                in_dir.push(SharedLibraryFile { library, path });
            }
        }
        in_dir.sort_by(|a, b| a.library.cmp(&b.library).then_with(|| a.path.cmp(&b.path)));
        found.extend(in_dir);
    }
    Ok(found)
}

fn library_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let stem = file_name.strip_suffix(SHARED_LIBRARY_FILE_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_for_environment() {
        let set = ConfigFileSet::new(Some("production"), "/srv/app");
        assert_eq!(
            set.enumerate(),
            vec![
                PathBuf::from("/srv/app/appsettings.json"),
                PathBuf::from("/srv/app/appsettings.production.json"),
                PathBuf::from("/srv/app/appsettings.production.local.json"),
            ]
        );
        assert_eq!(set.template_values_file(), PathBuf::from("/srv/app/values.json"));
    }

    #[test]
    fn test_file_set_without_environment() {
        let set = ConfigFileSet::new(Some("  "), "/srv/app");
        assert_eq!(set.environment(), None);
        assert_eq!(set.enumerate(), vec![PathBuf::from("/srv/app/appsettings.json")]);
    }

    #[test]
    fn test_shared_library_files_are_discovered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Zeta.settings.json"), "{}").unwrap();
        std::fs::write(dir.path().join("alpha.settings.json"), "{}").unwrap();
        std::fs::write(dir.path().join("alpha.json"), "{}").unwrap();
        std::fs::write(dir.path().join(".settings.json"), "{}").unwrap();
        std::fs::create_dir(dir.path().join("nested.settings.json")).unwrap();

        let missing = dir.path().join("missing");
        let files = shared_library_files(&[missing, dir.path().to_path_buf()]).unwrap();
        let libraries: Vec<_> = files.iter().map(|f| f.library.as_str()).collect();
        assert_eq!(libraries, vec!["alpha", "zeta"]);
    }
}
