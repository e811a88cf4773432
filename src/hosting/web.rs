//! Web host.
//!
//! The entry module supplies a [`HostingStartup`] that shapes the HTTP
//! surface; the host then starts the components and serves until shutdown.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::{ConfigTree, WebSettings};
use crate::error::HostError;
use crate::hosting::HostingBase;
use crate::lifecycle::Shutdown;
use crate::loading::{ModuleLoadError, ModuleLoader};

/// Capability an entry module implements to configure the web host.
pub trait HostingStartup: Send + Sync {
    fn configure(&self, builder: WebHostBuilder) -> WebHostBuilder;
}

/// Router and listener settings under construction.
pub struct WebHostBuilder {
    router: Router,
    bind_address: String,
    configuration: Arc<ConfigTree>,
    loader: Arc<dyn ModuleLoader>,
}

impl WebHostBuilder {
    pub fn new(settings: WebSettings, configuration: Arc<ConfigTree>, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            router: Router::new(),
            bind_address: settings.bind_address,
            configuration,
            loader,
        }
    }

    pub fn configuration(&self) -> Arc<ConfigTree> {
        self.configuration.clone()
    }

    pub fn loader(&self) -> Arc<dyn ModuleLoader> {
        self.loader.clone()
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn with_bind_address(mut self, address: impl Into<String>) -> Self {
        self.bind_address = address.into();
        self
    }

    /// Transform the router, e.g. to add routes or layers.
    pub fn map_router(mut self, f: impl FnOnce(Router) -> Router) -> Self {
        self.router = f(self.router);
        self
    }

    pub fn merge(self, other: Router) -> Self {
        self.map_router(|router| router.merge(other))
    }

    /// The finished router with request tracing, and the bind address.
    pub fn into_parts(self) -> (Router, String) {
        (self.router.layer(TraceLayer::new_for_http()), self.bind_address)
    }
}

pub struct WebHost {
    base: HostingBase,
}

impl WebHost {
    pub fn new(base: HostingBase) -> Self {
        Self { base }
    }

    pub async fn run(self, shutdown: Shutdown) -> Result<(), HostError> {
        let application = self.base.prepare()?;
        let entry = &application.modules().entry;
        let startup = entry
            .module()
            .hosting_startup()
            .ok_or_else(|| ModuleLoadError::MissingHostingStartup {
                module: entry.name().to_string(),
            })?;

        let configuration = application.configuration();
        let settings: WebSettings = configuration.section("web").bind_or_default()?;
        let builder = WebHostBuilder::new(settings, configuration, application.modules().context.clone());
        let (router, bind_address) = startup.configure(builder).into_parts();

        self.base.enter_component_dir()?;
        application.start(&shutdown.graceful_token()).await?;

        let served = serve(router, &bind_address, &shutdown).await;
        application.stop(&shutdown.forced_token()).await;
        served
    }
}

/// Serve until graceful shutdown begins.
async fn serve(router: Router, bind_address: &str, shutdown: &Shutdown) -> Result<(), HostError> {
    let listener = TcpListener::bind(bind_address).await.map_err(HostError::Web)?;
    let addr = listener.local_addr().map_err(HostError::Web)?;
    tracing::info!(address = %addr, "HTTP server starting");

    let graceful = shutdown.graceful_token();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { graceful.cancelled().await })
        .await
        .map_err(HostError::Web)?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
