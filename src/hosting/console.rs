//! Console host: start, wait for a termination signal, stop.

use crate::error::HostError;
use crate::hosting::HostingBase;
use crate::lifecycle::Shutdown;

pub struct ConsoleHost {
    base: HostingBase,
}

impl ConsoleHost {
    pub fn new(base: HostingBase) -> Self {
        Self { base }
    }

    pub async fn run(self, shutdown: Shutdown) -> Result<(), HostError> {
        let application = self.base.prepare()?;
        self.base.enter_component_dir()?;

        application.start(&shutdown.graceful_token()).await?;
        tracing::info!("Host started; waiting for shutdown signal");

        shutdown.wait().await;
        application.stop(&shutdown.forced_token()).await;
        tracing::info!("Shutdown complete");
        Ok(())
    }
}
