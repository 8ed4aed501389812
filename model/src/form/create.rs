use super::{FormError, FormModel, FormResult, FormState};
use crate::field::FormField;
use crate::rules::{self, NamePolicy};
use crate::types::{
    ContainerFormData, ContainerStatus, ContainerType, CreateContainerRequest, Location,
    ReferenceData, ValidationResult,
};
use tracing::debug;

/// Form model for a container that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateFormModel {
    state: FormState,
}

impl CreateFormModel {
    /// A physical development container with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(reference_data: ReferenceData) -> Self {
        Self::new().with_reference_data(reference_data)
    }

    /// Back to defaults, keeping the loaded reference lists.
    pub fn reset(&self) -> Self {
        Self::with_reference(self.state.reference_data.clone())
    }

    pub fn to_create_request(&self) -> FormResult<CreateContainerRequest> {
        let validation = self.validate_form();
        if !validation.is_valid {
            debug!(
                errors = validation.errors.len(),
                "refusing to build create request"
            );
            return Err(FormError::Invalid {
                errors: validation.errors,
            });
        }

        let data = &self.state.form_data;
        let tenant_id = data.tenant_id.ok_or(FormError::MissingField {
            field: FormField::TenantId,
        })?;
        let physical = data.container_type == ContainerType::Physical;

        Ok(CreateContainerRequest {
            name: data.name.trim().to_string(),
            tenant_id,
            container_type: data.container_type,
            purpose: data.purpose,
            location: request_location(data),
            notes: data.notes.trim().to_string(),
            shadow_service_enabled: data.shadow_service_enabled,
            copied_environment_from: if physical {
                None
            } else {
                data.copied_environment_from
            },
            robotics_simulation_enabled: !physical && data.robotics_simulation_enabled,
            ecosystem_connected: data.ecosystem_connected,
            ecosystem_settings: data.ecosystem_settings,
            status: ContainerStatus::Created,
            seed_type_ids: data.seed_types.clone(),
        })
    }
}

/// Trimmed location for physical containers, empty strings otherwise.
pub(crate) fn request_location(data: &ContainerFormData) -> Location {
    match (&data.container_type, &data.location) {
        (ContainerType::Physical, Some(location)) => location.trimmed(),
        _ => Location::default(),
    }
}

impl FormModel for CreateFormModel {
    const TRACKS_BASELINE: bool = false;

    fn state(&self) -> &FormState {
        &self.state
    }

    fn with_state(&self, state: FormState) -> Self {
        Self { state }
    }

    fn validate_form(&self) -> ValidationResult {
        ValidationResult::from_errors(rules::validate_form_data(
            &self.state.form_data,
            NamePolicy::Strict,
        ))
    }

    fn is_field_readonly(&self, _field: FormField) -> bool {
        false
    }

    fn has_changes(&self) -> bool {
        self.state.form_data != ContainerFormData::default()
    }
}
