//! Business rules for container forms.
//!
//! Every function here is pure: it reads form data and reference lists and
//! returns a verdict, never touching shared state. The form models and the
//! controllers compose these into validation passes and advisory output.

use crate::field::FormField;
use crate::types::{
    AwsEnvironment, ContainerFormData, ContainerType, EcosystemSettings, FaEnvironment, Location,
    Purpose, PyaEnvironment, SeedType, SeedTypeId, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const NAME_MIN_LENGTH: usize = 3;
pub const NAME_MAX_LENGTH: usize = 50;
pub const MIN_SEED_TYPES: usize = 1;
pub const MAX_SEED_TYPES: usize = 10;

pub const NAME_REQUIRED: &str = "Container name is required";
pub const NAME_FORMAT: &str =
    "Container name must be 3-50 characters and contain only letters, numbers, hyphens and underscores";
pub const TENANT_REQUIRED: &str = "Tenant is required";
pub const SEED_TYPES_REQUIRED: &str = "At least one seed type must be selected";
pub const SEED_TYPES_TOO_MANY: &str = "No more than 10 seed types can be selected";
pub const LOCATION_REQUIRED: &str =
    "City, country and address are required for physical containers";
pub const VIRTUAL_TO_PHYSICAL: &str =
    "Virtual containers cannot be converted to physical containers because existing crops would be affected";
pub const PRODUCTION_SEED_TYPES: &str = "Production containers require at least one seed type";
pub const DEVELOPMENT_ENVIRONMENTS: &str =
    "Development containers cannot use prod or stage ecosystem environments";

/// How strictly `validate_form_data` checks the container name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePolicy {
    /// Non-empty and matching the allowed character set and length.
    Strict,
    /// Non-empty only. Used once the name is fixed by the server.
    RequiredOnly,
}

/// How risky a set of edits is for a running container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummaryEntry {
    pub field: FormField,
    pub old_value: String,
    pub new_value: String,
    pub display_name: String,
}

pub fn required_fields(container_type: ContainerType) -> Vec<FormField> {
    let mut fields = vec![
        FormField::Name,
        FormField::TenantId,
        FormField::Type,
        FormField::Purpose,
        FormField::SeedTypes,
    ];
    if container_type == ContainerType::Physical {
        fields.push(FormField::Location);
    }
    fields
}

pub fn environment_settings_for_purpose(purpose: Purpose) -> EcosystemSettings {
    match purpose {
        Purpose::Development => {
            EcosystemSettings::new(FaEnvironment::Alpha, PyaEnvironment::Dev, AwsEnvironment::Dev)
        }
        Purpose::Research => {
            EcosystemSettings::new(FaEnvironment::Prod, PyaEnvironment::Test, AwsEnvironment::Prod)
        }
        Purpose::Production => {
            EcosystemSettings::new(FaEnvironment::Prod, PyaEnvironment::Stage, AwsEnvironment::Prod)
        }
    }
}

/// Same table keyed by name; unknown purposes get the development row.
pub fn environment_settings_for_purpose_name(purpose: &str) -> EcosystemSettings {
    environment_settings_for_purpose(Purpose::parse_lenient(purpose))
}

pub fn is_location_complete(location: Option<&Location>) -> bool {
    match location {
        Some(location) => {
            !location.city.trim().is_empty()
                && !location.country.trim().is_empty()
                && !location.address.trim().is_empty()
        }
        None => false,
    }
}

fn name_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^[a-zA-Z0-9_-]+$").expect("container name pattern compiles")
    })
}

pub fn is_valid_container_name_format(name: &str) -> bool {
    let length = name.chars().count();
    (NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) && name_pattern().is_match(name)
}

pub fn is_valid_seed_type_selection(ids: &[SeedTypeId]) -> bool {
    (MIN_SEED_TYPES..=MAX_SEED_TYPES).contains(&ids.len())
}

/// Field-level checks shared by the create and edit forms.
pub fn validate_form_data(data: &ContainerFormData, name_policy: NamePolicy) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let name = data.name.trim();
    if name.is_empty() {
        errors.push(ValidationError::new(FormField::Name.as_str(), NAME_REQUIRED));
    } else if name_policy == NamePolicy::Strict && !is_valid_container_name_format(name) {
        errors.push(ValidationError::new(FormField::Name.as_str(), NAME_FORMAT));
    }

    if data.tenant_id.is_none() {
        errors.push(ValidationError::new(FormField::TenantId.as_str(), TENANT_REQUIRED));
    }

    if data.seed_types.len() < MIN_SEED_TYPES {
        errors.push(ValidationError::new(FormField::SeedTypes.as_str(), SEED_TYPES_REQUIRED));
    } else if data.seed_types.len() > MAX_SEED_TYPES {
        errors.push(ValidationError::new(FormField::SeedTypes.as_str(), SEED_TYPES_TOO_MANY));
    }

    if data.container_type == ContainerType::Physical
        && !is_location_complete(data.location.as_ref())
    {
        errors.push(ValidationError::new(FormField::Location.as_str(), LOCATION_REQUIRED));
    }

    errors
}

pub fn changed_fields(current: &ContainerFormData, original: &ContainerFormData) -> Vec<FormField> {
    FormField::ALL
        .iter()
        .copied()
        .filter(|field| field.differs(current, original))
        .collect()
}

pub fn calculate_modification_risk(
    current: &ContainerFormData,
    original: &ContainerFormData,
) -> RiskLevel {
    let changed = changed_fields(current, original);
    let any = |fields: &[FormField]| fields.iter().any(|f| changed.contains(f));

    if any(&[FormField::Type, FormField::Purpose, FormField::EcosystemConnected]) {
        RiskLevel::High
    } else if any(&[FormField::TenantId, FormField::SeedTypes, FormField::Location]) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Rules that only apply when editing an existing container.
pub fn validate_container_edit(
    current: &ContainerFormData,
    original: &ContainerFormData,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if original.container_type == ContainerType::Virtual
        && current.container_type == ContainerType::Physical
    {
        errors.push(ValidationError::new(FormField::Type.as_str(), VIRTUAL_TO_PHYSICAL));
    }

    if current.container_type == ContainerType::Physical
        && !is_location_complete(current.location.as_ref())
    {
        errors.push(ValidationError::new(FormField::Location.as_str(), LOCATION_REQUIRED));
    }

    if current.purpose == Purpose::Production && current.seed_types.is_empty() {
        errors.push(ValidationError::new(
            FormField::SeedTypes.as_str(),
            PRODUCTION_SEED_TYPES,
        ));
    }

    if current.purpose == Purpose::Development
        && current.ecosystem_connected
        && current.ecosystem_settings.uses_production_tier()
    {
        errors.push(ValidationError::new(
            FormField::EcosystemSettings.as_str(),
            DEVELOPMENT_ENVIRONMENTS,
        ));
    }

    errors
}

pub fn is_ecosystem_change_unsafe(current: &ContainerFormData, original: &ContainerFormData) -> bool {
    if original.ecosystem_connected && !current.ecosystem_connected {
        return true;
    }
    current.purpose == Purpose::Production
        && current.ecosystem_settings != original.ecosystem_settings
}

fn format_seed_types(ids: &[SeedTypeId], catalog: &[SeedType]) -> String {
    if ids.is_empty() {
        return "None".to_string();
    }
    ids.iter()
        .map(|id| match catalog.iter().find(|s| s.id == *id) {
            Some(seed_type) => seed_type.name.clone(),
            None => format!("Seed type #{id}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_ecosystem_settings(settings: &EcosystemSettings) -> String {
    format!(
        "fa: {}, pya: {}, aws: {}, mbai: {}",
        settings.fa.environment.as_str(),
        settings.pya.environment.as_str(),
        settings.aws.environment.as_str(),
        settings.mbai.environment.as_str(),
    )
}

fn enabled(value: bool) -> String {
    let label = if value { "Enabled" } else { "Disabled" };
    label.to_string()
}

fn format_field(field: FormField, data: &ContainerFormData, catalog: &[SeedType]) -> String {
    match field {
        FormField::Name => data.name.clone(),
        FormField::TenantId => match data.tenant_id {
            Some(id) => format!("Tenant #{id}"),
            None => "None".to_string(),
        },
        FormField::Type => data.container_type.to_string(),
        FormField::Purpose => data.purpose.to_string(),
        FormField::SeedTypes => format_seed_types(&data.seed_types, catalog),
        FormField::Location => match &data.location {
            Some(location) => location.to_string(),
            None => "Not set".to_string(),
        },
        FormField::Notes => {
            if data.notes.is_empty() {
                "(empty)".to_string()
            } else {
                data.notes.clone()
            }
        }
        FormField::ShadowServiceEnabled => enabled(data.shadow_service_enabled),
        FormField::CopiedEnvironmentFrom => match data.copied_environment_from {
            Some(id) => format!("Container #{id}"),
            None => "None".to_string(),
        },
        FormField::RoboticsSimulationEnabled => enabled(data.robotics_simulation_enabled),
        FormField::EcosystemConnected => {
            let label = if data.ecosystem_connected {
                "Connected"
            } else {
                "Disconnected"
            };
            label.to_string()
        }
        FormField::EcosystemSettings => format_ecosystem_settings(&data.ecosystem_settings),
    }
}

pub fn generate_change_summary(
    current: &ContainerFormData,
    original: &ContainerFormData,
    seed_type_catalog: &[SeedType],
) -> Vec<ChangeSummaryEntry> {
    changed_fields(current, original)
        .into_iter()
        .map(|field| ChangeSummaryEntry {
            field,
            old_value: format_field(field, original, seed_type_catalog),
            new_value: format_field(field, current, seed_type_catalog),
            display_name: field.label().to_string(),
        })
        .collect()
}

/// Advisory notes for a pending edit. Never blocks submission.
pub fn recommended_actions(current: &ContainerFormData, original: &ContainerFormData) -> Vec<String> {
    let mut actions = Vec::new();
    let changed = changed_fields(current, original);

    if changed.contains(&FormField::Purpose) && current.purpose == Purpose::Production {
        actions.push("Production containers require additional monitoring setup".to_string());
    }

    if changed.contains(&FormField::Type) && current.container_type == ContainerType::Virtual {
        actions.push(
            "Archive sensor data from the physical site before switching to a virtual container"
                .to_string(),
        );
    }

    if changed.contains(&FormField::Location) {
        actions.push("Notify on-site staff about the location change".to_string());
    }

    if current.ecosystem_connected && !original.ecosystem_connected {
        actions.push(
            "Verify fa, pya and aws credentials before the ecosystem connection goes live"
                .to_string(),
        );
    }

    if is_ecosystem_change_unsafe(current, original) {
        actions.push(
            "Coordinate ecosystem environment changes with the operations team".to_string(),
        );
    }

    if changed.contains(&FormField::SeedTypes) && current.purpose == Purpose::Production {
        actions.push("Update the crop schedule to match the new seed types".to_string());
    }

    if calculate_modification_risk(current, original) == RiskLevel::High {
        actions.push("Schedule this change outside of an active growing cycle".to_string());
    }

    actions
}
