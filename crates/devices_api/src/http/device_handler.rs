use crate::domain::{
    parse_device_state, CreateDeviceRequest, DeleteDeviceRequest, DeviceSearchCriteria,
    DeviceService, GetDeviceRequest, ReplaceDeviceRequest, UpdateDeviceRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::{DateTime, Utc};
use common::domain::{Device, DeviceState};
use common::http::{domain_error_to_response, json_rejection_to_response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// JSON body accepted by create, full update and partial update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceBody {
    pub name: Option<String>,
    pub brand: Option<String>,
    /// Kept as text; the service parses it after its existence and field checks
    pub state: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
}

/// Query string for `/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceSearchQuery {
    pub brand: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
    pub creation_time: DateTime<Utc>,
}

pub fn to_device_response(device: Device) -> DeviceResponse {
    DeviceResponse {
        id: device.device_id,
        name: device.name,
        brand: device.brand,
        state: device.state,
        creation_time: device.created_at,
    }
}

fn device_body(body: Result<Json<DeviceBody>, JsonRejection>) -> Result<DeviceBody, Response> {
    body.map(|Json(body)| body)
        .map_err(json_rejection_to_response)
}

// `?brand=` reads as "no brand filter"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub async fn create_device(
    State(service): State<Arc<DeviceService>>,
    body: Result<Json<DeviceBody>, JsonRejection>,
) -> Result<Json<DeviceResponse>, Response> {
    let body = device_body(body)?;
    debug!(name = ?body.name, brand = ?body.brand, "Received create device request");

    let device = service
        .create_device(CreateDeviceRequest {
            name: body.name,
            brand: body.brand,
            state: body.state,
        })
        .await
        .map_err(domain_error_to_response)?;

    Ok(Json(to_device_response(device)))
}

pub async fn get_device(
    State(service): State<Arc<DeviceService>>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceResponse>, Response> {
    let device = service
        .get_device(GetDeviceRequest { device_id })
        .await
        .map_err(domain_error_to_response)?;

    Ok(Json(to_device_response(device)))
}

pub async fn list_devices(
    State(service): State<Arc<DeviceService>>,
) -> Result<Json<Vec<DeviceResponse>>, Response> {
    let devices = service
        .list_devices()
        .await
        .map_err(domain_error_to_response)?;

    Ok(Json(devices.into_iter().map(to_device_response).collect()))
}

pub async fn search_devices(
    State(service): State<Arc<DeviceService>>,
    Query(query): Query<DeviceSearchQuery>,
) -> Result<Json<Vec<DeviceResponse>>, Response> {
    let state = non_empty(query.state)
        .as_deref()
        .map(parse_device_state)
        .transpose()
        .map_err(domain_error_to_response)?;

    let devices = service
        .list_devices_by_criteria(DeviceSearchCriteria {
            brand: non_empty(query.brand),
            state,
        })
        .await
        .map_err(domain_error_to_response)?;

    Ok(Json(devices.into_iter().map(to_device_response).collect()))
}

pub async fn replace_device(
    State(service): State<Arc<DeviceService>>,
    Path(device_id): Path<String>,
    body: Result<Json<DeviceBody>, JsonRejection>,
) -> Result<Json<DeviceResponse>, Response> {
    let body = device_body(body)?;
    debug!(device_id = %device_id, "Received full device update");

    let device = service
        .replace_device(ReplaceDeviceRequest {
            device_id,
            name: body.name,
            brand: body.brand,
            state: body.state,
            creation_time: body.creation_time,
        })
        .await
        .map_err(domain_error_to_response)?;

    Ok(Json(to_device_response(device)))
}

pub async fn update_device(
    State(service): State<Arc<DeviceService>>,
    Path(device_id): Path<String>,
    body: Result<Json<DeviceBody>, JsonRejection>,
) -> Result<Json<DeviceResponse>, Response> {
    let body = device_body(body)?;
    debug!(device_id = %device_id, "Received partial device update");

    let device = service
        .update_device(UpdateDeviceRequest {
            device_id,
            name: body.name,
            brand: body.brand,
            state: body.state,
            creation_time: body.creation_time,
        })
        .await
        .map_err(domain_error_to_response)?;

    Ok(Json(to_device_response(device)))
}

pub async fn delete_device(
    State(service): State<Arc<DeviceService>>,
    Path(device_id): Path<String>,
) -> Result<StatusCode, Response> {
    service
        .delete_device(DeleteDeviceRequest { device_id })
        .await
        .map_err(domain_error_to_response)?;

    Ok(StatusCode::NO_CONTENT)
}
