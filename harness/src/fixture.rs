//! TOML fixtures that seed an [`InMemoryBackend`].

use crate::memory::InMemoryBackend;
use chrono::Utc;
use model::prelude::*;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid form config: {message}")]
    InvalidConfig { message: String },

    #[error("Container '{container}' references unknown seed type #{id}")]
    UnknownSeedType { container: String, id: SeedTypeId },

    #[error("Container '{container}' references unknown tenant #{id}")]
    UnknownTenant { container: String, id: TenantId },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureContainer {
    pub id: ContainerId,
    pub name: String,
    pub tenant_id: TenantId,
    #[serde(rename = "type", default)]
    pub container_type: ContainerType,
    #[serde(default)]
    pub purpose: Purpose,
    pub location: Option<Location>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub shadow_service_enabled: bool,
    pub copied_environment_from: Option<ContainerId>,
    #[serde(default)]
    pub robotics_simulation_enabled: bool,
    #[serde(default)]
    pub ecosystem_connected: bool,
    #[serde(default)]
    pub seed_type_ids: Vec<SeedTypeId>,
    /// Reason modification is denied, if any.
    pub locked: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    pub config: Option<FormConfig>,
    #[serde(default, rename = "tenant")]
    pub tenants: Vec<Tenant>,
    #[serde(default, rename = "seed_type")]
    pub seed_types: Vec<SeedType>,
    #[serde(default, rename = "container")]
    pub containers: Vec<FixtureContainer>,
}

impl Fixture {
    pub fn from_toml_str(source: &str) -> Result<Self, FixtureError> {
        let fixture: Fixture = toml::from_str(source)?;
        if let Some(config) = &fixture.config {
            config
                .validate()
                .map_err(|message| FixtureError::InvalidConfig { message })?;
        }
        Ok(fixture)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn form_config(&self) -> FormConfig {
        self.config.clone().unwrap_or_default()
    }

    /// Resolves seed type references and builds the backend.
    ///
    /// Connected containers get the environments their purpose implies.
    pub fn into_backend(self) -> Result<InMemoryBackend, FixtureError> {
        let now = Utc::now();
        let mut containers = Vec::with_capacity(self.containers.len());
        let mut locks = Vec::new();

        for entry in self.containers {
            if !self.tenants.iter().any(|t| t.id == entry.tenant_id) {
                return Err(FixtureError::UnknownTenant {
                    container: entry.name,
                    id: entry.tenant_id,
                });
            }

            let mut seed_types = Vec::with_capacity(entry.seed_type_ids.len());
            for id in &entry.seed_type_ids {
                match self.seed_types.iter().find(|s| s.id == *id) {
                    Some(seed_type) => seed_types.push(seed_type.clone()),
                    None => {
                        return Err(FixtureError::UnknownSeedType {
                            container: entry.name,
                            id: *id,
                        })
                    }
                }
            }

            let ecosystem_settings = if entry.ecosystem_connected {
                model::rules::environment_settings_for_purpose(entry.purpose)
            } else {
                EcosystemSettings::neutral()
            };

            if let Some(reason) = entry.locked {
                locks.push((entry.id, reason));
            }

            containers.push(Container {
                id: entry.id,
                name: entry.name,
                tenant_id: entry.tenant_id,
                container_type: entry.container_type,
                purpose: entry.purpose,
                location: entry.location,
                notes: entry.notes,
                shadow_service_enabled: entry.shadow_service_enabled,
                copied_environment_from: entry.copied_environment_from,
                robotics_simulation_enabled: entry.robotics_simulation_enabled,
                ecosystem_connected: entry.ecosystem_connected,
                ecosystem_settings,
                status: ContainerStatus::Active,
                seed_types,
                created_at: now,
                updated_at: now,
            });
        }

        let backend = InMemoryBackend::new(self.tenants, self.seed_types, containers);
        for (id, reason) in locks {
            backend.lock(id, reason);
        }
        Ok(backend)
    }
}
