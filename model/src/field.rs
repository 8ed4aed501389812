//! Typed field access for form updates.
//!
//! `FormField` names a settable field of [`ContainerFormData`] and
//! `FieldUpdate` pairs it with a value of the matching type, so a single
//! setter can dispatch on the variant without stringly-typed lookups.

use crate::types::{
    ContainerFormData, ContainerId, ContainerType, EcosystemSettings, Location, Purpose,
    SeedTypeId, TenantId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Name,
    TenantId,
    #[serde(rename = "type")]
    Type,
    Purpose,
    SeedTypes,
    Location,
    Notes,
    ShadowServiceEnabled,
    CopiedEnvironmentFrom,
    RoboticsSimulationEnabled,
    EcosystemConnected,
    EcosystemSettings,
}

impl FormField {
    pub const ALL: [FormField; 12] = [
        FormField::Name,
        FormField::TenantId,
        FormField::Type,
        FormField::Purpose,
        FormField::SeedTypes,
        FormField::Location,
        FormField::Notes,
        FormField::ShadowServiceEnabled,
        FormField::CopiedEnvironmentFrom,
        FormField::RoboticsSimulationEnabled,
        FormField::EcosystemConnected,
        FormField::EcosystemSettings,
    ];

    /// Field name as used in validation errors and change lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::TenantId => "tenantId",
            FormField::Type => "type",
            FormField::Purpose => "purpose",
            FormField::SeedTypes => "seedTypes",
            FormField::Location => "location",
            FormField::Notes => "notes",
            FormField::ShadowServiceEnabled => "shadowServiceEnabled",
            FormField::CopiedEnvironmentFrom => "copiedEnvironmentFrom",
            FormField::RoboticsSimulationEnabled => "roboticsSimulationEnabled",
            FormField::EcosystemConnected => "ecosystemConnected",
            FormField::EcosystemSettings => "ecosystemSettings",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Name => "Container Name",
            FormField::TenantId => "Tenant",
            FormField::Type => "Container Type",
            FormField::Purpose => "Purpose",
            FormField::SeedTypes => "Seed Types",
            FormField::Location => "Location",
            FormField::Notes => "Notes",
            FormField::ShadowServiceEnabled => "Shadow Service",
            FormField::CopiedEnvironmentFrom => "Copied Environment From",
            FormField::RoboticsSimulationEnabled => "Robotics Simulation",
            FormField::EcosystemConnected => "Ecosystem Connection",
            FormField::EcosystemSettings => "Ecosystem Settings",
        }
    }

    /// Whether `current` and `original` differ in this field.
    pub fn differs(&self, current: &ContainerFormData, original: &ContainerFormData) -> bool {
        match self {
            FormField::Name => current.name != original.name,
            FormField::TenantId => current.tenant_id != original.tenant_id,
            FormField::Type => current.container_type != original.container_type,
            FormField::Purpose => current.purpose != original.purpose,
            FormField::SeedTypes => !same_selection(&current.seed_types, &original.seed_types),
            FormField::Location => current.location != original.location,
            FormField::Notes => current.notes != original.notes,
            FormField::ShadowServiceEnabled => {
                current.shadow_service_enabled != original.shadow_service_enabled
            }
            FormField::CopiedEnvironmentFrom => {
                current.copied_environment_from != original.copied_environment_from
            }
            FormField::RoboticsSimulationEnabled => {
                current.robotics_simulation_enabled != original.robotics_simulation_enabled
            }
            FormField::EcosystemConnected => {
                current.ecosystem_connected != original.ecosystem_connected
            }
            FormField::EcosystemSettings => {
                current.ecosystem_settings != original.ecosystem_settings
            }
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A new value for one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Name(String),
    TenantId(Option<TenantId>),
    Type(ContainerType),
    Purpose(Purpose),
    SeedTypes(Vec<SeedTypeId>),
    Location(Option<Location>),
    Notes(String),
    ShadowServiceEnabled(bool),
    CopiedEnvironmentFrom(Option<ContainerId>),
    RoboticsSimulationEnabled(bool),
    EcosystemConnected(bool),
    EcosystemSettings(EcosystemSettings),
}

impl FieldUpdate {
    pub fn field(&self) -> FormField {
        match self {
            FieldUpdate::Name(_) => FormField::Name,
            FieldUpdate::TenantId(_) => FormField::TenantId,
            FieldUpdate::Type(_) => FormField::Type,
            FieldUpdate::Purpose(_) => FormField::Purpose,
            FieldUpdate::SeedTypes(_) => FormField::SeedTypes,
            FieldUpdate::Location(_) => FormField::Location,
            FieldUpdate::Notes(_) => FormField::Notes,
            FieldUpdate::ShadowServiceEnabled(_) => FormField::ShadowServiceEnabled,
            FieldUpdate::CopiedEnvironmentFrom(_) => FormField::CopiedEnvironmentFrom,
            FieldUpdate::RoboticsSimulationEnabled(_) => FormField::RoboticsSimulationEnabled,
            FieldUpdate::EcosystemConnected(_) => FormField::EcosystemConnected,
            FieldUpdate::EcosystemSettings(_) => FormField::EcosystemSettings,
        }
    }

    /// Writes the value into `data`. No cross-field invariants are applied here.
    pub fn apply(self, data: &mut ContainerFormData) {
        match self {
            FieldUpdate::Name(value) => data.name = value,
            FieldUpdate::TenantId(value) => data.tenant_id = value,
            FieldUpdate::Type(value) => data.container_type = value,
            FieldUpdate::Purpose(value) => data.purpose = value,
            FieldUpdate::SeedTypes(value) => {
                let mut unique = Vec::with_capacity(value.len());
                for id in value {
                    if !unique.contains(&id) {
                        unique.push(id);
                    }
                }
                data.seed_types = unique;
            }
            FieldUpdate::Location(value) => data.location = value,
            FieldUpdate::Notes(value) => data.notes = value,
            FieldUpdate::ShadowServiceEnabled(value) => data.shadow_service_enabled = value,
            FieldUpdate::CopiedEnvironmentFrom(value) => data.copied_environment_from = value,
            FieldUpdate::RoboticsSimulationEnabled(value) => {
                data.robotics_simulation_enabled = value
            }
            FieldUpdate::EcosystemConnected(value) => data.ecosystem_connected = value,
            FieldUpdate::EcosystemSettings(value) => data.ecosystem_settings = value,
        }
    }
}

/// Seed type selections compare as sets; order carries no meaning.
fn same_selection(a: &[SeedTypeId], b: &[SeedTypeId]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    a.dedup();
    b.sort_unstable();
    b.dedup();
    a == b
}
