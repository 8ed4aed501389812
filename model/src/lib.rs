pub mod backend;
pub mod config;
pub mod field;
pub mod form;
pub mod rules;
pub mod types;

pub use backend::{BackendError, BackendResult, ContainerBackend};
pub use config::FormConfig;
pub use field::{FieldUpdate, FormField};
pub use form::{CreateFormModel, EditFormModel, FormError, FormModel, FormResult, FormState};
pub use rules::{ChangeSummaryEntry, NamePolicy, RiskLevel};
pub use types::{
    AwsEnvironment, Container, ContainerFormData, ContainerId, ContainerStatus, ContainerSummary,
    ContainerType, CreateContainerRequest, EcosystemSettings, EditContainerFormData,
    EnvironmentSetting, FaEnvironment, Location, MbaiEnvironment, ModifyPermission,
    NameValidation, Purpose, PyaEnvironment, ReadonlyFields, ReferenceData, SeedType, SeedTypeId,
    Tenant, TenantId, UpdateContainerRequest, ValidationError, ValidationResult,
};

pub mod prelude {
    pub use crate::backend::*;
    pub use crate::config::*;
    pub use crate::field::*;
    pub use crate::form::*;
    pub use crate::rules::{ChangeSummaryEntry, NamePolicy, RiskLevel};
    pub use crate::types::*;
}
