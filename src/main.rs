//! hostbox
//!
//! Loads an entry module and its dependencies, assembles configuration,
//! and runs the discovered components until shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!   hostbox -p app/service.bin [-s libs] [--web]
//!        │
//!        ▼
//!   ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │    cli     │──▶│ host config  │──▶│ observability│
//!   └────────────┘   │ + env vars   │   │ logs/metrics │
//!                    └──────┬───────┘   └──────────────┘
//!                           ▼
//!   ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │  loading   │──▶│    config    │──▶│  lifecycle   │
//!   │ resolve +  │   │  assemble +  │   │ start / stop │
//!   │ discover   │   │  templates   │   │  components  │
//!   └────────────┘   └──────────────┘   └──────┬───────┘
//!                                              ▼
//!                                  console wait | web serve
//! ```

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use hostbox::cli::HostArgs;
use hostbox::config::host::load_host_configuration;
use hostbox::config::{HostSettings, LoggingSettings};
use hostbox::error::{error_chain, HostError};
use hostbox::lifecycle::signals::spawn_signal_listener;
use hostbox::lifecycle::Shutdown;
use hostbox::modules::builtin_catalog;
use hostbox::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let args = HostArgs::parse();

    if args.confirm_start {
        confirm("Press enter to start");
    }

    let result = run(&args).await;
    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // No-op when the configured subscriber is already installed.
            let _ = logging::init_logging(&LoggingSettings::default());
            tracing::error!(fatal = true, error = %error_chain(&error), "Host terminated");
            ExitCode::FAILURE
        }
    };

    if args.confirm_finish {
        confirm("Press enter to finish");
    }
    code
}

async fn run(args: &HostArgs) -> Result<(), HostError> {
    let host_configuration = load_host_configuration(&host_settings_dir(), std::env::vars_os())?;
    let settings = HostSettings::from_tree(&host_configuration)?;

    logging::init_logging(&settings.logging)?;
    metrics::init_metrics(&settings.metrics);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hostbox starting");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    hostbox::hosting::run(args, host_configuration, builtin_catalog(), shutdown).await
}

/// Directory of the running executable, where `hostsettings.json` lives.
fn host_settings_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn confirm(prompt: &str) {
    println!("{}", prompt);
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
