use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Available,
    InUse,
    Inactive,
}

impl DeviceState {
    pub const ALL: [DeviceState; 3] = [
        DeviceState::Available,
        DeviceState::InUse,
        DeviceState::Inactive,
    ];

    /// Storage and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Available => "AVAILABLE",
            DeviceState::InUse => "IN_USE",
            DeviceState::Inactive => "INACTIVE",
        }
    }

    /// Whether name/brand changes and deletion are allowed in this state
    pub fn allows_mutation(&self) -> bool {
        !matches!(self, DeviceState::InUse)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid device state: {0}")]
pub struct ParseDeviceStateError(pub String);

impl FromStr for DeviceState {
    type Err = ParseDeviceStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ParseDeviceStateError(s.to_string()))
    }
}

/// Domain representation of a managed device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub device_id: String,
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
    pub created_at: DateTime<Utc>,
}

/// Repository input for creating a device (id and creation time already assigned)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDeviceRepoInput {
    pub device_id: String,
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
    pub created_at: DateTime<Utc>,
}

/// Repository input for getting a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDeviceRepoInput {
    pub device_id: String,
}

/// Repository input for overwriting the mutable fields of a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDeviceRepoInput {
    pub device_id: String,
    pub name: String,
    pub brand: String,
    pub state: DeviceState,
}

/// Repository input for deleting a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDeviceRepoInput {
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDevicesByBrandRepoInput {
    pub brand: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDevicesByStateRepoInput {
    pub state: DeviceState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDevicesByBrandAndStateRepoInput {
    pub brand: String,
    pub state: DeviceState,
}

impl From<Device> for UpdateDeviceRepoInput {
    fn from(device: Device) -> Self {
        Self {
            device_id: device.device_id,
            name: device.name,
            brand: device.brand,
            state: device.state,
        }
    }
}

/// Repository trait for device storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Persist a new device
    async fn create_device(&self, input: CreateDeviceRepoInput) -> DomainResult<Device>;

    /// Get a device by ID
    async fn get_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>>;

    /// Overwrite name, brand and state. Creation time is never written.
    async fn update_device(&self, input: UpdateDeviceRepoInput) -> DomainResult<Device>;

    /// Delete a device. Deleting a missing device is not an error.
    async fn delete_device(&self, input: DeleteDeviceRepoInput) -> DomainResult<()>;

    /// List every device
    async fn list_devices(&self) -> DomainResult<Vec<Device>>;

    async fn list_devices_by_brand(
        &self,
        input: ListDevicesByBrandRepoInput,
    ) -> DomainResult<Vec<Device>>;

    async fn list_devices_by_state(
        &self,
        input: ListDevicesByStateRepoInput,
    ) -> DomainResult<Vec<Device>>;

    async fn list_devices_by_brand_and_state(
        &self,
        input: ListDevicesByBrandAndStateRepoInput,
    ) -> DomainResult<Vec<Device>>;
}
