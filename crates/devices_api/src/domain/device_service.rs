use crate::domain::device_lifecycle::{self, parse_device_state, DeviceChanges, DeviceQuery};
use chrono::{DateTime, SubsecRound, Utc};
use common::domain::{
    CreateDeviceRepoInput, DeleteDeviceRepoInput, Device, DeviceRepository, DeviceState,
    DomainError, DomainResult, GetDeviceRepoInput, ListDevicesByBrandAndStateRepoInput,
    ListDevicesByBrandRepoInput, ListDevicesByStateRepoInput,
};
use common::garde::validate_struct;
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Service request for registering a device
#[derive(Debug, Clone, Default, Validate)]
pub struct CreateDeviceRequest {
    #[garde(required, length(min = 1))]
    pub name: Option<String>,
    #[garde(required, length(min = 1))]
    pub brand: Option<String>,
    /// Raw state text, parsed once the request passes validation
    #[garde(required)]
    pub state: Option<String>,
}

/// Service request for getting a device
#[derive(Debug, Clone, Validate)]
pub struct GetDeviceRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
}

/// Service request for filtering devices. Absent criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct DeviceSearchCriteria {
    pub brand: Option<String>,
    pub state: Option<DeviceState>,
}

/// Service request for a partial update. Only supplied fields change.
///
/// Field rules are checked only after the device is found, so a missing id
/// always reports `DeviceNotFound`.
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateDeviceRequest {
    #[garde(skip)]
    pub device_id: String,
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(length(min = 1))]
    pub brand: Option<String>,
    #[garde(skip)]
    pub state: Option<String>,
    #[garde(skip)]
    pub creation_time: Option<DateTime<Utc>>,
}

/// Service request for a full update. Name, brand and state are mandatory.
#[derive(Debug, Clone, Default, Validate)]
pub struct ReplaceDeviceRequest {
    #[garde(skip)]
    pub device_id: String,
    #[garde(required, length(min = 1))]
    pub name: Option<String>,
    #[garde(required, length(min = 1))]
    pub brand: Option<String>,
    #[garde(required)]
    pub state: Option<String>,
    #[garde(skip)]
    pub creation_time: Option<DateTime<Utc>>,
}

/// Service request for removing a device
#[derive(Debug, Clone, Validate)]
pub struct DeleteDeviceRequest {
    #[garde(length(min = 1))]
    pub device_id: String,
}

/// Service for device business logic
pub struct DeviceService {
    device_repository: Arc<dyn DeviceRepository>,
}

impl DeviceService {
    pub fn new(device_repository: Arc<dyn DeviceRepository>) -> Self {
        Self { device_repository }
    }

    /// Register a new device. The id and creation time are assigned here.
    #[instrument(skip(self, request), fields(name = ?request.name, brand = ?request.brand))]
    pub async fn create_device(&self, request: CreateDeviceRequest) -> DomainResult<Device> {
        validate_struct(&request)?;

        let (Some(name), Some(brand), Some(state)) = (request.name, request.brand, request.state)
        else {
            return Err(DomainError::MissingFields(
                "name, brand and state are required".to_string(),
            ));
        };
        let state = parse_device_state(&state)?;

        let device_id = xid::new().to_string();
        debug!(device_id = %device_id, "Creating device");

        // Postgres keeps microseconds; truncate so the returned record matches later reads
        let created_at = Utc::now().trunc_subsecs(6);

        let device = self
            .device_repository
            .create_device(CreateDeviceRepoInput {
                device_id,
                name,
                brand,
                state,
                created_at,
            })
            .await?;

        info!(device_id = %device.device_id, "Device created successfully");
        Ok(device)
    }

    /// Get a device by ID
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn get_device(&self, request: GetDeviceRequest) -> DomainResult<Device> {
        validate_struct(&request)?;
        self.find_device(&request.device_id).await
    }

    /// List every device
    #[instrument(skip(self))]
    pub async fn list_devices(&self) -> DomainResult<Vec<Device>> {
        let devices = self.device_repository.list_devices().await?;
        debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// List devices matching the supplied brand and/or state
    #[instrument(skip(self), fields(brand = ?criteria.brand, state = ?criteria.state))]
    pub async fn list_devices_by_criteria(
        &self,
        criteria: DeviceSearchCriteria,
    ) -> DomainResult<Vec<Device>> {
        let devices = match DeviceQuery::from_criteria(criteria.brand, criteria.state) {
            DeviceQuery::All => self.device_repository.list_devices().await?,
            DeviceQuery::ByBrand(brand) => {
                self.device_repository
                    .list_devices_by_brand(ListDevicesByBrandRepoInput { brand })
                    .await?
            }
            DeviceQuery::ByState(state) => {
                self.device_repository
                    .list_devices_by_state(ListDevicesByStateRepoInput { state })
                    .await?
            }
            DeviceQuery::ByBrandAndState(brand, state) => {
                self.device_repository
                    .list_devices_by_brand_and_state(ListDevicesByBrandAndStateRepoInput {
                        brand,
                        state,
                    })
                    .await?
            }
        };

        debug!(count = devices.len(), "Listed devices by criteria");
        Ok(devices)
    }

    /// Partially update a device
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn update_device(&self, request: UpdateDeviceRequest) -> DomainResult<Device> {
        let current = self.find_device(&request.device_id).await?;
        validate_struct(&request)?;

        let changes = DeviceChanges {
            name: request.name,
            brand: request.brand,
            state: request.state.as_deref().map(parse_device_state).transpose()?,
            creation_time: request.creation_time,
        };
        self.apply_changes(current, changes).await
    }

    /// Fully update a device
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn replace_device(&self, request: ReplaceDeviceRequest) -> DomainResult<Device> {
        let current = self.find_device(&request.device_id).await?;
        validate_struct(&request)?;

        let changes = DeviceChanges {
            name: request.name,
            brand: request.brand,
            state: request.state.as_deref().map(parse_device_state).transpose()?,
            creation_time: request.creation_time,
        };
        self.apply_changes(current, changes).await
    }

    /// Remove a device unless it is in use
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    pub async fn delete_device(&self, request: DeleteDeviceRequest) -> DomainResult<()> {
        validate_struct(&request)?;

        let current = self.find_device(&request.device_id).await?;
        device_lifecycle::ensure_deletable(&current).inspect_err(|e| {
            error!(device_id = %current.device_id, error = %e, "Rejected device removal");
        })?;

        self.device_repository
            .delete_device(DeleteDeviceRepoInput {
                device_id: request.device_id,
            })
            .await?;

        info!("Device deleted successfully");
        Ok(())
    }

    async fn find_device(&self, device_id: &str) -> DomainResult<Device> {
        self.device_repository
            .get_device(GetDeviceRepoInput {
                device_id: device_id.to_string(),
            })
            .await?
            .ok_or_else(|| DomainError::DeviceNotFound(device_id.to_string()))
    }

    async fn apply_changes(&self, current: Device, changes: DeviceChanges) -> DomainResult<Device> {
        let updated = device_lifecycle::apply_update(&current, changes).inspect_err(|e| {
            error!(device_id = %current.device_id, error = %e, "Rejected device update");
        })?;

        if updated == current {
            debug!("No field changed, skipping write");
            return Ok(current);
        }

        let device = self
            .device_repository
            .update_device(updated.into())
            .await?;

        info!(device_id = %device.device_id, "Device updated successfully");
        Ok(device)
    }
}
