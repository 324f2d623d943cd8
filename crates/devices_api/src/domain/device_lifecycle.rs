//! Rules deciding whether a device may be mutated or removed.
//!
//! Everything here is a pure function of the stored record and the requested
//! change, so the service can read, decide and write without holding state.

use chrono::{DateTime, Utc};
use common::domain::{Device, DeviceState, DomainError, DomainResult};

pub const DEVICE_IN_USE_UPDATE_MESSAGE: &str =
    "Name and brand cannot be updated if the device is in use";
pub const DEVICE_IN_USE_DELETE_MESSAGE: &str = "Devices in use cannot be removed";
pub const CREATION_TIME_IMMUTABLE_MESSAGE: &str = "Creation time cannot be changed";

/// Field changes requested by an update. `None` leaves the stored value untouched.
///
/// No device field can be cleared, so `None` never means "remove".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub state: Option<DeviceState>,
    /// Only checked against the stored value, never written
    pub creation_time: Option<DateTime<Utc>>,
}

/// Narrowest store lookup for a brand/state filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceQuery {
    All,
    ByBrand(String),
    ByState(DeviceState),
    ByBrandAndState(String, DeviceState),
}

impl DeviceQuery {
    pub fn from_criteria(brand: Option<String>, state: Option<DeviceState>) -> Self {
        match (brand, state) {
            (Some(brand), Some(state)) => DeviceQuery::ByBrandAndState(brand, state),
            (Some(brand), None) => DeviceQuery::ByBrand(brand),
            (None, Some(state)) => DeviceQuery::ByState(state),
            (None, None) => DeviceQuery::All,
        }
    }
}

/// Parse client-supplied state text. Unknown values are rejected as an invalid update.
pub fn parse_device_state(value: &str) -> DomainResult<DeviceState> {
    value
        .parse::<DeviceState>()
        .map_err(|e| DomainError::ImmutableField(e.to_string()))
}

/// Merge `changes` onto `current`, enforcing:
/// - a supplied creation time must equal the stored one
/// - name and brand are frozen while the *stored* state is `IN_USE`, even when the
///   same request moves the device out of `IN_USE`
///
/// A supplied value equal to the stored one is not a change.
pub fn apply_update(current: &Device, changes: DeviceChanges) -> DomainResult<Device> {
    if let Some(requested) = changes.creation_time {
        if requested != current.created_at {
            return Err(DomainError::ImmutableField(
                CREATION_TIME_IMMUTABLE_MESSAGE.to_string(),
            ));
        }
    }

    let renames = changes
        .name
        .as_deref()
        .is_some_and(|name| name != current.name);
    let rebrands = changes
        .brand
        .as_deref()
        .is_some_and(|brand| brand != current.brand);

    if !current.state.allows_mutation() && (renames || rebrands) {
        return Err(DomainError::DeviceInUse(
            DEVICE_IN_USE_UPDATE_MESSAGE.to_string(),
        ));
    }

    Ok(Device {
        device_id: current.device_id.clone(),
        name: changes.name.unwrap_or_else(|| current.name.clone()),
        brand: changes.brand.unwrap_or_else(|| current.brand.clone()),
        state: changes.state.unwrap_or(current.state),
        created_at: current.created_at,
    })
}

/// A device may only be removed while it is not `IN_USE`
pub fn ensure_deletable(current: &Device) -> DomainResult<()> {
    if current.state.allows_mutation() {
        Ok(())
    } else {
        Err(DomainError::DeviceInUse(
            DEVICE_IN_USE_DELETE_MESSAGE.to_string(),
        ))
    }
}
