use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ContainerId = i64;
pub type TenantId = i64;
pub type SeedTypeId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    #[default]
    Physical,
    Virtual,
}

impl ContainerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerType::Physical => "physical",
            ContainerType::Virtual => "virtual",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    #[default]
    Development,
    Research,
    Production,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Development => "development",
            Purpose::Research => "research",
            Purpose::Production => "production",
        }
    }

    /// Parses a purpose name, falling back to `Development` for anything unknown.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "research" => Purpose::Research,
            "production" => Purpose::Production,
            _ => Purpose::Development,
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub address: String,
}

impl Location {
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            address: address.into(),
        }
    }

    pub fn trimmed(&self) -> Self {
        Self {
            city: self.city.trim().to_string(),
            country: self.country.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.address, self.city, self.country)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedType {
    pub id: SeedTypeId,
    pub name: String,
    pub variety: String,
    pub supplier: String,
    pub batch_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
}

/// A container offered as the source for a virtual container's environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FaEnvironment {
    #[default]
    Alpha,
    Prod,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PyaEnvironment {
    #[default]
    Dev,
    Test,
    Stage,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AwsEnvironment {
    #[default]
    Dev,
    Prod,
}

/// The mbai system only ever runs against production.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MbaiEnvironment {
    #[default]
    Prod,
}

impl MbaiEnvironment {
    pub fn as_str(&self) -> &'static str {
        "prod"
    }
}

impl FaEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaEnvironment::Alpha => "alpha",
            FaEnvironment::Prod => "prod",
        }
    }

    pub fn is_production_tier(&self) -> bool {
        matches!(self, FaEnvironment::Prod)
    }
}

impl PyaEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            PyaEnvironment::Dev => "dev",
            PyaEnvironment::Test => "test",
            PyaEnvironment::Stage => "stage",
        }
    }

    pub fn is_production_tier(&self) -> bool {
        matches!(self, PyaEnvironment::Stage)
    }
}

impl AwsEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwsEnvironment::Dev => "dev",
            AwsEnvironment::Prod => "prod",
        }
    }

    pub fn is_production_tier(&self) -> bool {
        matches!(self, AwsEnvironment::Prod)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EnvironmentSetting<E> {
    pub environment: E,
}

impl<E> EnvironmentSetting<E> {
    pub fn new(environment: E) -> Self {
        Self { environment }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EcosystemSettings {
    pub fa: EnvironmentSetting<FaEnvironment>,
    pub pya: EnvironmentSetting<PyaEnvironment>,
    pub aws: EnvironmentSetting<AwsEnvironment>,
    pub mbai: EnvironmentSetting<MbaiEnvironment>,
}

impl EcosystemSettings {
    pub fn new(fa: FaEnvironment, pya: PyaEnvironment, aws: AwsEnvironment) -> Self {
        Self {
            fa: EnvironmentSetting::new(fa),
            pya: EnvironmentSetting::new(pya),
            aws: EnvironmentSetting::new(aws),
            mbai: EnvironmentSetting::new(MbaiEnvironment::Prod),
        }
    }

    /// Settings used while the ecosystem is disconnected.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// True if any user-selectable system points at a production or staging tier.
    pub fn uses_production_tier(&self) -> bool {
        self.fa.environment.is_production_tier()
            || self.pya.environment.is_production_tier()
            || self.aws.environment.is_production_tier()
    }
}

/// The editable state behind both the create and the edit form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContainerFormData {
    pub name: String,
    pub tenant_id: Option<TenantId>,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub purpose: Purpose,
    pub seed_types: Vec<SeedTypeId>,
    pub location: Option<Location>,
    pub notes: String,
    pub shadow_service_enabled: bool,
    pub copied_environment_from: Option<ContainerId>,
    pub robotics_simulation_enabled: bool,
    pub ecosystem_connected: bool,
    pub ecosystem_settings: EcosystemSettings,
}

impl ContainerFormData {
    /// Hydrates form data from a container loaded from the backend.
    pub fn from_container(container: &Container) -> Self {
        let mut seed_types = Vec::with_capacity(container.seed_types.len());
        for seed_type in &container.seed_types {
            if !seed_types.contains(&seed_type.id) {
                seed_types.push(seed_type.id);
            }
        }

        Self {
            name: container.name.clone(),
            tenant_id: Some(container.tenant_id),
            container_type: container.container_type,
            purpose: container.purpose,
            seed_types,
            location: container.location.clone(),
            notes: container.notes.clone(),
            shadow_service_enabled: container.shadow_service_enabled,
            copied_environment_from: container.copied_environment_from,
            robotics_simulation_enabled: container.robotics_simulation_enabled,
            ecosystem_connected: container.ecosystem_connected,
            ecosystem_settings: container.ecosystem_settings,
        }
    }
}

/// Fields the edit form refuses to change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadonlyFields {
    pub name: bool,
    pub ecosystem_connected: bool,
}

impl ReadonlyFields {
    pub fn for_container(container: &Container) -> Self {
        Self {
            name: true,
            ecosystem_connected: container.ecosystem_connected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditContainerFormData {
    pub id: ContainerId,
    #[serde(flatten)]
    pub form: ContainerFormData,
    pub readonly: ReadonlyFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Active,
    Maintenance,
    Inactive,
}

/// A container as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Container {
    pub id: ContainerId,
    pub name: String,
    pub tenant_id: TenantId,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub purpose: Purpose,
    pub location: Option<Location>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub shadow_service_enabled: bool,
    #[serde(default)]
    pub copied_environment_from: Option<ContainerId>,
    #[serde(default)]
    pub robotics_simulation_enabled: bool,
    #[serde(default)]
    pub ecosystem_connected: bool,
    #[serde(default)]
    pub ecosystem_settings: EcosystemSettings,
    pub status: ContainerStatus,
    #[serde(default)]
    pub seed_types: Vec<SeedType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateContainerRequest {
    pub name: String,
    pub tenant_id: TenantId,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub purpose: Purpose,
    pub location: Location,
    pub notes: String,
    pub shadow_service_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_environment_from: Option<ContainerId>,
    pub robotics_simulation_enabled: bool,
    pub ecosystem_connected: bool,
    pub ecosystem_settings: EcosystemSettings,
    pub status: ContainerStatus,
    pub seed_type_ids: Vec<SeedTypeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateContainerRequest {
    pub tenant_id: TenantId,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub purpose: Purpose,
    pub location: Location,
    pub notes: String,
    pub shadow_service_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_environment_from: Option<ContainerId>,
    pub robotics_simulation_enabled: bool,
    pub ecosystem_settings: EcosystemSettings,
    pub seed_type_ids: Vec<SeedTypeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NameValidation {
    pub is_valid: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModifyPermission {
    pub can_modify: bool,
    pub reason: Option<String>,
}

impl ModifyPermission {
    pub fn allowed() -> Self {
        Self {
            can_modify: true,
            reason: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            can_modify: false,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Reference lists the form reads but never writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub tenants: Vec<Tenant>,
    pub seed_types: Vec<SeedType>,
    pub available_containers: Vec<ContainerSummary>,
}
