//! HTTP-backed codec module loader.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    CodecModuleLoader, HttpClient, HttpRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fetches a module's resource and reports success on a 2xx response.
///
/// Hosts that materialise modules differently (bundled, pre-installed)
/// inject their own [`CodecModuleLoader`].
pub struct HttpModuleLoader {
    http: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl HttpModuleLoader {
    pub fn new(http: Arc<dyn HttpClient>, timeout: Duration) -> Self {
        Self { http, timeout }
    }
}

#[async_trait]
impl CodecModuleLoader for HttpModuleLoader {
    async fn load(&self, module: &str, locator: &str) -> Result<()> {
        debug!(module, locator, "Fetching codec module");

        let response = self
            .http
            .execute(HttpRequest::get(locator).timeout(self.timeout))
            .await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(BridgeError::OperationFailed(format!(
                "module {} returned HTTP {}",
                module, response.status
            )))
        }
    }
}
