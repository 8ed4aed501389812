//! In-memory [`ContainerBackend`] used by the CLI and the tests.

use async_trait::async_trait;
use chrono::Utc;
use model::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LoadContainer,
    ListTenants,
    ListSeedTypes,
    ListAvailableContainers,
    CreateContainer,
    UpdateContainer,
    ValidateContainerName,
    CanModifyContainer,
}

#[derive(Debug, Default)]
struct BackendState {
    tenants: Vec<Tenant>,
    seed_types: Vec<SeedType>,
    containers: Vec<Container>,
    locked: HashMap<ContainerId, String>,
    failures: HashMap<Operation, BackendError>,
    calls: HashMap<Operation, usize>,
}

impl BackendState {
    /// Counts the call and returns the injected failure for it, if any.
    fn enter(&mut self, operation: Operation) -> BackendResult<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        match self.failures.get(&operation) {
            Some(err) => {
                debug!(?operation, error = %err, "injected failure");
                Err(err.clone())
            }
            None => Ok(()),
        }
    }

    fn name_taken(&self, name: &str) -> bool {
        self.containers
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name.trim()))
    }

    fn resolve_seed_types(&self, ids: &[SeedTypeId]) -> Result<Vec<SeedType>, ValidationError> {
        ids.iter()
            .map(|id| {
                self.seed_types
                    .iter()
                    .find(|s| s.id == *id)
                    .cloned()
                    .ok_or_else(|| {
                        ValidationError::new(
                            FormField::SeedTypes.as_str(),
                            format!("Unknown seed type #{id}"),
                        )
                    })
            })
            .collect()
    }

    fn check_tenant(&self, tenant_id: TenantId) -> Option<ValidationError> {
        if self.tenants.iter().any(|t| t.id == tenant_id) {
            None
        } else {
            Some(ValidationError::new(
                FormField::TenantId.as_str(),
                format!("Unknown tenant #{tenant_id}"),
            ))
        }
    }
}

fn stored_location(container_type: ContainerType, location: Location) -> Option<Location> {
    match container_type {
        ContainerType::Physical => Some(location),
        ContainerType::Virtual => None,
    }
}

pub struct InMemoryBackend {
    state: Mutex<BackendState>,
}

impl InMemoryBackend {
    pub fn new(tenants: Vec<Tenant>, seed_types: Vec<SeedType>, containers: Vec<Container>) -> Self {
        Self {
            state: Mutex::new(BackendState {
                tenants,
                seed_types,
                containers,
                ..Default::default()
            }),
        }
    }

    /// A small farm with two tenants, twelve seed types and three containers.
    pub fn demo() -> Self {
        let tenants = vec![
            Tenant {
                id: 1,
                name: "Acme Farms".to_string(),
            },
            Tenant {
                id: 2,
                name: "Green Valley Co-op".to_string(),
            },
        ];

        let seed_types = [
            ("Basil", "Genovese"),
            ("Lettuce", "Romaine"),
            ("Kale", "Lacinato"),
            ("Mint", "Spearmint"),
            ("Tomato", "Cherry"),
            ("Spinach", "Bloomsdale"),
            ("Arugula", "Wild Rocket"),
            ("Cilantro", "Santo"),
            ("Chard", "Rainbow"),
            ("Pak Choi", "Joi Choi"),
            ("Parsley", "Flat Leaf"),
            ("Radish", "French Breakfast"),
        ]
        .iter()
        .zip(1..)
        .map(|((name, variety), id)| SeedType {
            id,
            name: name.to_string(),
            variety: variety.to_string(),
            supplier: if id % 2 == 0 { "Acme Seeds" } else { "Nordic Growers" }.to_string(),
            batch_id: format!("B-{}", 100 + id),
        })
        .collect::<Vec<_>>();

        let pick = |ids: &[SeedTypeId]| -> Vec<SeedType> {
            seed_types
                .iter()
                .filter(|s| ids.contains(&s.id))
                .cloned()
                .collect()
        };
        let now = Utc::now();

        let containers = vec![
            Container {
                id: 1,
                name: "north-bay-01".to_string(),
                tenant_id: 1,
                container_type: ContainerType::Physical,
                purpose: Purpose::Development,
                location: Some(Location::new("Oslo", "Norway", "Dock 4")),
                notes: "Pilot install".to_string(),
                shadow_service_enabled: false,
                copied_environment_from: None,
                robotics_simulation_enabled: false,
                ecosystem_connected: false,
                ecosystem_settings: EcosystemSettings::neutral(),
                status: ContainerStatus::Active,
                seed_types: pick(&[1, 2]),
                created_at: now,
                updated_at: now,
            },
            Container {
                id: 2,
                name: "sim-lab-02".to_string(),
                tenant_id: 1,
                container_type: ContainerType::Virtual,
                purpose: Purpose::Research,
                location: None,
                notes: String::new(),
                shadow_service_enabled: true,
                copied_environment_from: Some(1),
                robotics_simulation_enabled: true,
                ecosystem_connected: true,
                ecosystem_settings: model::rules::environment_settings_for_purpose(
                    Purpose::Research,
                ),
                status: ContainerStatus::Active,
                seed_types: pick(&[3]),
                created_at: now,
                updated_at: now,
            },
            Container {
                id: 3,
                name: "harbor-prod-03".to_string(),
                tenant_id: 2,
                container_type: ContainerType::Physical,
                purpose: Purpose::Production,
                location: Some(Location::new("Bergen", "Norway", "Pier 12")),
                notes: "Supplies the Bergen market".to_string(),
                shadow_service_enabled: true,
                copied_environment_from: None,
                robotics_simulation_enabled: false,
                ecosystem_connected: true,
                ecosystem_settings: model::rules::environment_settings_for_purpose(
                    Purpose::Production,
                ),
                status: ContainerStatus::Active,
                seed_types: pick(&[5, 6]),
                created_at: now,
                updated_at: now,
            },
        ];

        let backend = Self::new(tenants, seed_types, containers);
        backend.lock(3, "Container is in an active harvest cycle");
        backend
    }

    fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every call to `operation` fail with `err` until cleared.
    pub fn fail(&self, operation: Operation, err: BackendError) {
        self.state().failures.insert(operation, err);
    }

    pub fn clear_failure(&self, operation: Operation) {
        self.state().failures.remove(&operation);
    }

    /// Denies modification of `id` with the given reason.
    pub fn lock(&self, id: ContainerId, reason: impl Into<String>) {
        self.state().locked.insert(id, reason.into());
    }

    pub fn unlock(&self, id: ContainerId) {
        self.state().locked.remove(&id);
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        self.state().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn containers(&self) -> Vec<Container> {
        self.state().containers.clone()
    }
}

#[async_trait]
impl ContainerBackend for InMemoryBackend {
    async fn load_container(&self, id: ContainerId) -> BackendResult<Container> {
        let mut state = self.state();
        state.enter(Operation::LoadContainer)?;
        state
            .containers
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(BackendError::NotFound { id })
    }

    async fn list_tenants(&self) -> BackendResult<Vec<Tenant>> {
        let mut state = self.state();
        state.enter(Operation::ListTenants)?;
        Ok(state.tenants.clone())
    }

    async fn list_seed_types(&self, search: Option<&str>) -> BackendResult<Vec<SeedType>> {
        let mut state = self.state();
        state.enter(Operation::ListSeedTypes)?;

        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        Ok(state
            .seed_types
            .iter()
            .filter(|s| {
                needle.is_empty()
                    || s.name.to_lowercase().contains(&needle)
                    || s.variety.to_lowercase().contains(&needle)
                    || s.supplier.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn list_available_containers(
        &self,
        exclude_id: Option<ContainerId>,
    ) -> BackendResult<Vec<ContainerSummary>> {
        let mut state = self.state();
        state.enter(Operation::ListAvailableContainers)?;
        Ok(state
            .containers
            .iter()
            .filter(|c| Some(c.id) != exclude_id)
            .map(|c| ContainerSummary {
                id: c.id,
                name: c.name.clone(),
            })
            .collect())
    }

    async fn create_container(&self, request: CreateContainerRequest) -> BackendResult<Container> {
        let mut state = self.state();
        state.enter(Operation::CreateContainer)?;

        let mut errors = Vec::new();
        if state.name_taken(&request.name) {
            errors.push(ValidationError::new(
                FormField::Name.as_str(),
                "A container with this name already exists",
            ));
        }
        errors.extend(state.check_tenant(request.tenant_id));
        let seed_types = match state.resolve_seed_types(&request.seed_type_ids) {
            Ok(seed_types) => seed_types,
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };
        if !errors.is_empty() {
            return Err(BackendError::Validation { errors });
        }

        let id = state.containers.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let now = Utc::now();
        let container = Container {
            id,
            name: request.name,
            tenant_id: request.tenant_id,
            container_type: request.container_type,
            purpose: request.purpose,
            location: stored_location(request.container_type, request.location),
            notes: request.notes,
            shadow_service_enabled: request.shadow_service_enabled,
            copied_environment_from: request.copied_environment_from,
            robotics_simulation_enabled: request.robotics_simulation_enabled,
            ecosystem_connected: request.ecosystem_connected,
            ecosystem_settings: request.ecosystem_settings,
            status: request.status,
            seed_types,
            created_at: now,
            updated_at: now,
        };
        state.containers.push(container.clone());
        Ok(container)
    }

    async fn update_container(
        &self,
        id: ContainerId,
        request: UpdateContainerRequest,
    ) -> BackendResult<Container> {
        let mut state = self.state();
        state.enter(Operation::UpdateContainer)?;

        if let Some(reason) = state.locked.get(&id) {
            return Err(BackendError::PermissionDenied {
                reason: reason.clone(),
            });
        }

        let mut errors = Vec::new();
        errors.extend(state.check_tenant(request.tenant_id));
        let seed_types = match state.resolve_seed_types(&request.seed_type_ids) {
            Ok(seed_types) => seed_types,
            Err(err) => {
                errors.push(err);
                Vec::new()
            }
        };
        if !errors.is_empty() {
            return Err(BackendError::Validation { errors });
        }

        let container = state
            .containers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(BackendError::NotFound { id })?;

        container.tenant_id = request.tenant_id;
        container.container_type = request.container_type;
        container.purpose = request.purpose;
        container.location = stored_location(request.container_type, request.location);
        container.notes = request.notes;
        container.shadow_service_enabled = request.shadow_service_enabled;
        container.copied_environment_from = request.copied_environment_from;
        container.robotics_simulation_enabled = request.robotics_simulation_enabled;
        container.ecosystem_settings = request.ecosystem_settings;
        container.seed_types = seed_types;
        container.updated_at = Utc::now();
        Ok(container.clone())
    }

    async fn validate_container_name(&self, name: &str) -> BackendResult<NameValidation> {
        let mut state = self.state();
        state.enter(Operation::ValidateContainerName)?;

        if !state.name_taken(name) {
            return Ok(NameValidation {
                is_valid: true,
                suggestions: Vec::new(),
            });
        }

        let base = name.trim();
        let suggestions = (2..)
            .map(|n| format!("{base}-{n}"))
            .filter(|candidate| !state.name_taken(candidate))
            .take(3)
            .collect();
        Ok(NameValidation {
            is_valid: false,
            suggestions,
        })
    }

    async fn can_modify_container(&self, id: ContainerId) -> BackendResult<ModifyPermission> {
        let mut state = self.state();
        state.enter(Operation::CanModifyContainer)?;

        if !state.containers.iter().any(|c| c.id == id) {
            return Err(BackendError::NotFound { id });
        }
        Ok(match state.locked.get(&id) {
            Some(reason) => ModifyPermission::denied(reason.clone()),
            None => ModifyPermission::allowed(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
