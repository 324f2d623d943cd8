use crate::domain::DeviceService;
use crate::http::device_handler::{
    create_device, delete_device, get_device, list_devices, replace_device, search_devices,
    update_device,
};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use common::http::{run_http_server, HttpServerConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const DEVICES_API_PREFIX: &str = "/api/v1/devices";

/// Device routes plus `/health`, without middleware
pub fn build_devices_api_routes(service: Arc<DeviceService>) -> Router {
    let devices = Router::new()
        .route("/", get(list_devices).post(create_device))
        .route("/search", get(search_devices))
        .route(
            "/:device_id",
            get(get_device)
                .put(replace_device)
                .patch(update_device)
                .delete(delete_device),
        )
        .with_state(service);

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .nest(DEVICES_API_PREFIX, devices)
}

pub async fn run_devices_http_server(
    config: HttpServerConfig,
    service: Arc<DeviceService>,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    info!("Starting devices HTTP API");
    let router = build_devices_api_routes(service);
    run_http_server(config, router, cancellation_token).await
}
