use crate::domain::{
    CreateDeviceRepoInput, DeleteDeviceRepoInput, Device, DeviceRepository, DomainError,
    DomainResult, GetDeviceRepoInput, ListDevicesByBrandAndStateRepoInput,
    ListDevicesByBrandRepoInput, ListDevicesByStateRepoInput, UpdateDeviceRepoInput,
};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory implementation of DeviceRepository using HashMap
#[derive(Clone, Default)]
pub struct InMemoryDeviceRepository {
    devices: Arc<RwLock<HashMap<String, Device>>>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<Device>
    where
        F: Fn(&Device) -> bool,
    {
        let devices = self.devices.read().await;
        let mut matching: Vec<Device> = devices
            .values()
            .filter(|device| predicate(device))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.device_id.cmp(&b.device_id))
        });
        matching
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn create_device(&self, input: CreateDeviceRepoInput) -> DomainResult<Device> {
        let mut devices = self.devices.write().await;
        if devices.contains_key(&input.device_id) {
            return Err(DomainError::RepositoryError(anyhow!(
                "duplicate device id: {}",
                input.device_id
            )));
        }

        let device = Device {
            device_id: input.device_id,
            name: input.name,
            brand: input.brand,
            state: input.state,
            created_at: input.created_at,
        };
        devices.insert(device.device_id.clone(), device.clone());
        debug!("registered device: {}", device.device_id);
        Ok(device)
    }

    async fn get_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>> {
        let devices = self.devices.read().await;
        Ok(devices.get(&input.device_id).cloned())
    }

    async fn update_device(&self, input: UpdateDeviceRepoInput) -> DomainResult<Device> {
        let mut devices = self.devices.write().await;
        let device = devices
            .get_mut(&input.device_id)
            .ok_or_else(|| DomainError::DeviceNotFound(input.device_id.clone()))?;

        device.name = input.name;
        device.brand = input.brand;
        device.state = input.state;
        Ok(device.clone())
    }

    async fn delete_device(&self, input: DeleteDeviceRepoInput) -> DomainResult<()> {
        let mut devices = self.devices.write().await;
        devices.remove(&input.device_id);
        Ok(())
    }

    async fn list_devices(&self) -> DomainResult<Vec<Device>> {
        Ok(self.filtered(|_| true).await)
    }

    async fn list_devices_by_brand(
        &self,
        input: ListDevicesByBrandRepoInput,
    ) -> DomainResult<Vec<Device>> {
        Ok(self.filtered(|device| device.brand == input.brand).await)
    }

    async fn list_devices_by_state(
        &self,
        input: ListDevicesByStateRepoInput,
    ) -> DomainResult<Vec<Device>> {
        Ok(self.filtered(|device| device.state == input.state).await)
    }

    async fn list_devices_by_brand_and_state(
        &self,
        input: ListDevicesByBrandAndStateRepoInput,
    ) -> DomainResult<Vec<Device>> {
        Ok(self
            .filtered(|device| device.brand == input.brand && device.state == input.state)
            .await)
    }
}
