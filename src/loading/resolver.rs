//! Entry module and dependency resolution.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::loading::catalog::ModuleCatalog;
use crate::loading::context::LoadContext;
use crate::loading::manifest::{ModuleManifest, RuntimeIdentifier};
use crate::loading::module::LoadedModule;
use crate::loading::ModuleLoadError;

/// Everything the first loading phase produced.
#[derive(Debug, Clone)]
pub struct LoadedModules {
    pub entry: LoadedModule,
    pub manifest: ModuleManifest,
    /// Runtime dependencies in manifest order, entry module excluded.
    pub dependencies: Vec<LoadedModule>,
    pub context: Arc<LoadContext>,
}

/// Resolves an entry module file and its declared dependencies.
pub struct ModuleResolver {
    context: Arc<LoadContext>,
    runtime: RuntimeIdentifier,
}

impl ModuleResolver {
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self {
            context: Arc::new(LoadContext::new(catalog)),
            runtime: RuntimeIdentifier::current(),
        }
    }

    /// Resolve against another runtime identifier than the running one.
    pub fn with_runtime(mut self, runtime: RuntimeIdentifier) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn context(&self) -> Arc<LoadContext> {
        self.context.clone()
    }

    pub fn resolve(
        &self,
        module_path: &Path,
        shared_library_paths: &[PathBuf],
    ) -> Result<LoadedModules, ModuleLoadError> {
        let metadata = fs::metadata(module_path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ModuleLoadError::NotFound {
                    path: module_path.to_path_buf(),
                }
            } else {
                ModuleLoadError::Io {
                    path: module_path.to_path_buf(),
                    source,
                }
            }
        })?;
        if !metadata.is_file() {
            return Err(ModuleLoadError::NotAFile {
                path: module_path.to_path_buf(),
            });
        }

        let entry_name = module_name(module_path).ok_or_else(|| ModuleLoadError::NotAFile {
            path: module_path.to_path_buf(),
        })?;
        let entry = self.context.load(&entry_name, module_path);
        let manifest = ModuleManifest::load(module_path)?;

        let entry_dir = module_path.parent().unwrap_or_else(|| Path::new("."));
        let extension = module_path.extension().and_then(|e| e.to_str());

        let mut seen = HashSet::new();
        let mut dependencies = Vec::new();
        for dependency in manifest.runtime_dependencies(&self.runtime) {
            let name = dependency.name.to_lowercase();
            if name == entry.name() || !seen.insert(name.clone()) {
                continue;
            }

            let file_name = dependency.file_name(extension);
            let candidates = search_locations(&file_name, entry_dir, shared_library_paths);
            let found = candidates.iter().find(|c| c.is_file()).cloned();
            let path = found.ok_or_else(|| ModuleLoadError::UnresolvedDependency {
                module: entry.name().to_string(),
                dependency: dependency.name.clone(),
                searched: candidates,
            })?;

            dependencies.push(self.context.load(&name, &path));
        }

        tracing::info!(
            module = %entry.name(),
            runtime = %self.runtime,
            dependencies = dependencies.len(),
            "Resolved module"
        );

        Ok(LoadedModules {
            entry,
            manifest,
            dependencies,
            context: self.context.clone(),
        })
    }
}

fn module_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_lowercase())
}

fn search_locations(file_name: &Path, entry_dir: &Path, shared: &[PathBuf]) -> Vec<PathBuf> {
    if file_name.is_absolute() {
        return vec![file_name.to_path_buf()];
    }
    std::iter::once(entry_dir)
        .chain(shared.iter().map(PathBuf::as_path))
        .map(|dir| dir.join(file_name))
        .collect()
}
