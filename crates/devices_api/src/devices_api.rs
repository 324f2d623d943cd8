use crate::domain::DeviceService;
use crate::http::run_devices_http_server;
use common::http::HttpServerConfig;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct DevicesApi {
    service: Arc<DeviceService>,
    config: HttpServerConfig,
}

impl DevicesApi {
    pub fn new(service: Arc<DeviceService>, config: HttpServerConfig) -> Self {
        debug!("Initializing devices API module");
        Self { service, config }
    }

    pub fn into_runner_process(
        self,
    ) -> impl FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
    {
        move |ctx| {
            Box::pin(async move { run_devices_http_server(self.config, self.service, ctx).await })
        }
    }
}
