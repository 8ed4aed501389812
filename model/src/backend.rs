use crate::types::{
    Container, ContainerId, ContainerSummary, CreateContainerRequest, ModifyPermission,
    NameValidation, SeedType, Tenant, UpdateContainerRequest, ValidationError,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Container not found: {id}")]
    NotFound { id: ContainerId },

    #[error("Validation failed with {} error(s)", .errors.len())]
    Validation { errors: Vec<ValidationError> },

    #[error("Permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization {
            message: err.to_string(),
        }
    }
}

impl BackendError {
    /// Field-level errors carried by a rejected create or update, if any.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            BackendError::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Persistence boundary the form controllers talk to.
#[async_trait]
pub trait ContainerBackend: Send + Sync {
    async fn load_container(&self, id: ContainerId) -> BackendResult<Container>;

    async fn list_tenants(&self) -> BackendResult<Vec<Tenant>>;

    async fn list_seed_types(&self, search: Option<&str>) -> BackendResult<Vec<SeedType>>;

    async fn list_available_containers(
        &self,
        exclude_id: Option<ContainerId>,
    ) -> BackendResult<Vec<ContainerSummary>>;

    async fn create_container(&self, request: CreateContainerRequest) -> BackendResult<Container>;

    async fn update_container(
        &self,
        id: ContainerId,
        request: UpdateContainerRequest,
    ) -> BackendResult<Container>;

    async fn validate_container_name(&self, name: &str) -> BackendResult<NameValidation>;

    async fn can_modify_container(&self, id: ContainerId) -> BackendResult<ModifyPermission>;

    fn backend_name(&self) -> &'static str;
}
