//! Status module: a web entry module exposing host status routes.
//!
//! - `GET /health` returns `ok`
//! - `GET /modules` returns the loaded module names as JSON

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;

use crate::hosting::{HostingStartup, WebHostBuilder};
use crate::loading::{HostModule, ModuleLoader};

pub const MODULE_NAME: &str = "status";

#[derive(Debug, Default)]
pub struct StatusModule;

impl HostModule for StatusModule {
    fn hosting_startup(&self) -> Option<Arc<dyn HostingStartup>> {
        Some(Arc::new(StatusStartup))
    }
}

pub struct StatusStartup;

impl HostingStartup for StatusStartup {
    fn configure(&self, builder: WebHostBuilder) -> WebHostBuilder {
        let loader = builder.loader();
        builder.map_router(|router| {
            router
                .route("/health", get(|| async { "ok" }))
                .route("/modules", get(list_modules).with_state(loader))
        })
    }
}

async fn list_modules(State(loader): State<Arc<dyn ModuleLoader>>) -> Json<Vec<String>> {
    Json(loader.module_names())
}
