//! Host entry strategies.
//!
//! # Data Flow
//! ```text
//! HostArgs + host configuration
//!     → HostingBase::prepare
//!         ModuleResolver::resolve → ConfigAssembler::assemble → Application
//!     → console.rs: start → wait for shutdown → stop
//!     → web.rs:     HostingStartup → start → serve HTTP → stop
//! ```

pub mod console;
pub mod web;

use std::path::{Path, PathBuf};

use crate::application::Application;
use crate::cli::HostArgs;
use crate::config::{ConfigAssembler, ConfigTree, HostSettings, PlaceholderPattern};
use crate::error::HostError;
use crate::lifecycle::Shutdown;
use crate::loading::{ModuleCatalog, ModuleLoadError, ModuleResolver};

pub use console::ConsoleHost;
pub use web::{HostingStartup, WebHost, WebHostBuilder};

/// Preparation shared by every driver.
#[derive(Debug)]
pub struct HostingBase {
    component_path: PathBuf,
    shared_library_paths: Vec<PathBuf>,
    host_configuration: ConfigTree,
    placeholder: PlaceholderPattern,
    catalog: ModuleCatalog,
}

impl HostingBase {
    pub fn new(
        component_path: &Path,
        shared_library_paths: Vec<PathBuf>,
        host_configuration: ConfigTree,
        placeholder: PlaceholderPattern,
        catalog: ModuleCatalog,
    ) -> Result<Self, HostError> {
        Ok(Self {
            component_path: absolute(component_path)?,
            shared_library_paths,
            host_configuration,
            placeholder,
            catalog,
        })
    }

    pub fn from_args(args: &HostArgs, host_configuration: ConfigTree, catalog: ModuleCatalog) -> Result<Self, HostError> {
        let placeholder = PlaceholderPattern::new(&args.placeholder_pattern)?;
        Self::new(
            &args.path,
            args.shared_library_paths(),
            host_configuration,
            placeholder,
            catalog,
        )
    }

    pub fn component_path(&self) -> &Path {
        &self.component_path
    }

    /// Directory holding the entry module and its configuration files.
    pub fn component_dir(&self) -> &Path {
        self.component_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Resolve modules and assemble configuration.
    pub fn prepare(&self) -> Result<Application, HostError> {
        let settings = HostSettings::from_tree(&self.host_configuration)?;
        let modules = ModuleResolver::new(self.catalog.clone())
            .resolve(&self.component_path, &self.shared_library_paths)?;

        let assembler = ConfigAssembler::new(self.host_configuration.clone(), self.placeholder.clone());
        let configuration = assembler.assemble(
            settings.configuration.as_deref(),
            self.component_dir(),
            &self.shared_library_paths,
        )?;
        tracing::info!(
            environment = settings.configuration.as_deref().unwrap_or("<none>"),
            base_path = %self.component_dir().display(),
            "Assembled configuration"
        );

        Ok(Application::new(modules, configuration))
    }

    /// Make the component directory the working directory.
    pub fn enter_component_dir(&self) -> Result<(), HostError> {
        let dir = self.component_dir();
        std::env::set_current_dir(dir).map_err(|source| ModuleLoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %dir.display(), "Changed working directory");
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf, HostError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| ModuleLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}

/// Run the driver selected by `args` until shutdown.
pub async fn run(
    args: &HostArgs,
    host_configuration: ConfigTree,
    catalog: ModuleCatalog,
    shutdown: Shutdown,
) -> Result<(), HostError> {
    let base = HostingBase::from_args(args, host_configuration, catalog)?;
    tracing::info!(
        path = %base.component_path().display(),
        web = args.web,
        "Hosting module"
    );

    if args.web {
        WebHost::new(base).run(shutdown).await
    } else {
        ConsoleHost::new(base).run(shutdown).await
    }
}
