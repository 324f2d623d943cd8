mod device_lifecycle;
mod device_service;

pub use device_lifecycle::*;
pub use device_service::*;
