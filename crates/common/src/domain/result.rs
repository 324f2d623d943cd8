use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Device not found for this id :: {0}")]
    DeviceNotFound(String),

    #[error("Device brand, name and state are mandatory: {0}")]
    MissingFields(String),

    /// Raised for attempts to change the creation time and for unknown state values
    #[error("Invalid device update: {0}")]
    ImmutableField(String),

    #[error("Device in use: {0}")]
    DeviceInUse(String),

    #[error("Repository error: {0}")]
    RepositoryError(#[from] anyhow::Error),
}

impl DomainError {
    /// Stable machine-readable classification of the error
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::DeviceNotFound(_) => "device_not_found",
            DomainError::MissingFields(_) => "missing_fields",
            DomainError::ImmutableField(_) => "immutable_field",
            DomainError::DeviceInUse(_) => "device_in_use",
            DomainError::RepositoryError(_) => "repository_error",
        }
    }
}
