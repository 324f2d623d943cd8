use crate::domain::{
    CreateDeviceRepoInput, DeleteDeviceRepoInput, Device, DeviceRepository, DeviceState,
    DomainError, DomainResult, GetDeviceRepoInput, ListDevicesByBrandAndStateRepoInput,
    ListDevicesByBrandRepoInput, ListDevicesByStateRepoInput, UpdateDeviceRepoInput,
};
use crate::postgres::PostgresClient;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::{debug, instrument};

const SELECT_DEVICES: &str = "SELECT device_id, name, brand, state, created_at FROM devices";

/// Device row for PostgreSQL storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRow {
    pub device_id: String,
    pub name: String,
    pub brand: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Row> for DeviceRow {
    fn from(row: &Row) -> Self {
        DeviceRow {
            device_id: row.get(0),
            name: row.get(1),
            brand: row.get(2),
            state: row.get(3),
            created_at: row.get(4),
        }
    }
}

/// Convert database DeviceRow to domain Device
impl TryFrom<DeviceRow> for Device {
    type Error = DomainError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let state = row
            .state
            .parse::<DeviceState>()
            .map_err(|e| DomainError::RepositoryError(anyhow!("device {}: {}", row.device_id, e)))?;

        Ok(Device {
            device_id: row.device_id,
            name: row.name,
            brand: row.brand,
            state,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL implementation of DeviceRepository trait
#[derive(Clone)]
pub struct PostgresDeviceRepository {
    client: PostgresClient,
}

impl PostgresDeviceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }

    async fn query_devices(
        &self,
        filter: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> DomainResult<Vec<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let sql = format!("{} {} ORDER BY created_at, device_id", SELECT_DEVICES, filter);
        let rows = conn
            .query(sql.as_str(), params)
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        rows.iter()
            .map(|row| Device::try_from(DeviceRow::from(row)))
            .collect()
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    #[instrument(skip(self, input), fields(device_id = %input.device_id, brand = %input.brand, state = %input.state))]
    async fn create_device(&self, input: CreateDeviceRepoInput) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        conn.execute(
            "INSERT INTO devices (device_id, name, brand, state, created_at)
             VALUES ($1, $2, $3, $4, $5)",
            &[
                &input.device_id,
                &input.name,
                &input.brand,
                &input.state.as_str(),
                &input.created_at,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!("registered device: {}", input.device_id);

        Ok(Device {
            device_id: input.device_id,
            name: input.name,
            brand: input.brand,
            state: input.state,
            created_at: input.created_at,
        })
    }

    #[instrument(skip(self, input), fields(device_id = %input.device_id))]
    async fn get_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let sql = format!("{} WHERE device_id = $1", SELECT_DEVICES);
        let row = conn
            .query_opt(sql.as_str(), &[&input.device_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        row.map(|row| Device::try_from(DeviceRow::from(&row)))
            .transpose()
    }

    #[instrument(skip(self, input), fields(device_id = %input.device_id, state = %input.state))]
    async fn update_device(&self, input: UpdateDeviceRepoInput) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        // created_at is immutable and never part of the SET list
        let row = conn
            .query_opt(
                "UPDATE devices SET name = $2, brand = $3, state = $4
                 WHERE device_id = $1
                 RETURNING device_id, name, brand, state, created_at",
                &[
                    &input.device_id,
                    &input.name,
                    &input.brand,
                    &input.state.as_str(),
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => {
                debug!("updated device: {}", input.device_id);
                Device::try_from(DeviceRow::from(&row))
            }
            None => Err(DomainError::DeviceNotFound(input.device_id)),
        }
    }

    #[instrument(skip(self, input), fields(device_id = %input.device_id))]
    async fn delete_device(&self, input: DeleteDeviceRepoInput) -> DomainResult<()> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let deleted = conn
            .execute("DELETE FROM devices WHERE device_id = $1", &[&input.device_id])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(deleted, "deleted device: {}", input.device_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_devices(&self) -> DomainResult<Vec<Device>> {
        let devices = self.query_devices("", &[]).await?;
        debug!("found {} devices", devices.len());
        Ok(devices)
    }

    #[instrument(skip(self, input), fields(brand = %input.brand))]
    async fn list_devices_by_brand(
        &self,
        input: ListDevicesByBrandRepoInput,
    ) -> DomainResult<Vec<Device>> {
        let devices = self
            .query_devices("WHERE brand = $1", &[&input.brand])
            .await?;
        debug!("found {} devices for brand: {}", devices.len(), input.brand);
        Ok(devices)
    }

    #[instrument(skip(self, input), fields(state = %input.state))]
    async fn list_devices_by_state(
        &self,
        input: ListDevicesByStateRepoInput,
    ) -> DomainResult<Vec<Device>> {
        let devices = self
            .query_devices("WHERE state = $1", &[&input.state.as_str()])
            .await?;
        debug!("found {} devices in state: {}", devices.len(), input.state);
        Ok(devices)
    }

    #[instrument(skip(self, input), fields(brand = %input.brand, state = %input.state))]
    async fn list_devices_by_brand_and_state(
        &self,
        input: ListDevicesByBrandAndStateRepoInput,
    ) -> DomainResult<Vec<Device>> {
        let devices = self
            .query_devices(
                "WHERE brand = $1 AND state = $2",
                &[&input.brand, &input.state.as_str()],
            )
            .await?;
        debug!(
            "found {} devices for brand: {} in state: {}",
            devices.len(),
            input.brand,
            input.state
        );
        Ok(devices)
    }
}
