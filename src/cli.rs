//! Command-line surface of the `hostbox` binary.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::template::DEFAULT_PLACEHOLDER_PATTERN;

#[derive(Debug, Clone, Parser)]
#[command(name = "hostbox")]
#[command(about = "Loads component modules and runs them under one host", long_about = None)]
pub struct HostArgs {
    /// Entry module file.
    #[arg(short, long)]
    pub path: PathBuf,

    /// Shared-library search paths, joined with the platform path separator.
    #[arg(short, long = "shared-libraries-path")]
    pub shared_libraries_path: Option<OsString>,

    /// Run the web host instead of the console host.
    #[arg(long)]
    pub web: bool,

    /// Wait for enter before starting.
    #[arg(long)]
    pub confirm_start: bool,

    /// Wait for enter before exiting.
    #[arg(long)]
    pub confirm_finish: bool,

    /// Placeholder syntax for configuration templates.
    #[arg(long, default_value = DEFAULT_PLACEHOLDER_PATTERN)]
    pub placeholder_pattern: String,
}

impl HostArgs {
    pub fn shared_library_paths(&self) -> Vec<PathBuf> {
        match &self.shared_libraries_path {
            Some(joined) => std::env::split_paths(joined)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            None => Vec::new(),
        }
    }
}
