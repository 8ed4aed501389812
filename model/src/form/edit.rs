use super::create::request_location;
use super::{dedup_errors, FormError, FormModel, FormResult, FormState};
use crate::field::FormField;
use crate::rules::{self, ChangeSummaryEntry, NamePolicy, RiskLevel};
use crate::types::{
    Container, ContainerFormData, ContainerId, ContainerType, EditContainerFormData,
    ReadonlyFields, ReferenceData, UpdateContainerRequest, ValidationResult,
};
use tracing::debug;

/// Form model for an existing container.
///
/// Holds the last server-confirmed values as `original` so change detection
/// is a structural comparison at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFormModel {
    id: ContainerId,
    state: FormState,
    original: ContainerFormData,
    readonly: ReadonlyFields,
}

impl EditFormModel {
    pub fn from_container(container: &Container, reference_data: ReferenceData) -> Self {
        let form_data = ContainerFormData::from_container(container);
        Self {
            id: container.id,
            original: form_data.clone(),
            state: FormState {
                form_data,
                reference_data,
                validation_errors: Vec::new(),
            },
            readonly: ReadonlyFields::for_container(container),
        }
    }

    /// Placeholder for a container that has not been loaded yet.
    pub fn unloaded(id: ContainerId) -> Self {
        Self {
            id,
            state: FormState::default(),
            original: ContainerFormData::default(),
            readonly: ReadonlyFields {
                name: true,
                ecosystem_connected: false,
            },
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn original_form_data(&self) -> &ContainerFormData {
        &self.original
    }

    pub fn readonly(&self) -> ReadonlyFields {
        self.readonly
    }

    pub fn to_edit_form_data(&self) -> EditContainerFormData {
        EditContainerFormData {
            id: self.id,
            form: self.state.form_data.clone(),
            readonly: self.readonly,
        }
    }

    pub fn get_changed_fields(&self) -> Vec<FormField> {
        rules::changed_fields(&self.state.form_data, &self.original)
    }

    /// Discards local edits and errors; baseline and reference lists stay.
    pub fn reset(&self) -> Self {
        Self {
            id: self.id,
            state: FormState {
                form_data: self.original.clone(),
                reference_data: self.state.reference_data.clone(),
                validation_errors: Vec::new(),
            },
            original: self.original.clone(),
            readonly: self.readonly,
        }
    }

    /// Makes the submitted values the new baseline after a successful update.
    ///
    /// The update payload carries no ecosystem connection, so the local form
    /// data is kept as-is; only the id comes from the server's copy. A newly
    /// connected ecosystem becomes readonly, as it would on a fresh load.
    pub fn commit(&self, saved: &Container) -> Self {
        let form_data = self.state.form_data.clone();
        Self {
            id: saved.id,
            readonly: ReadonlyFields {
                name: true,
                ecosystem_connected: self.readonly.ecosystem_connected
                    || form_data.ecosystem_connected,
            },
            original: form_data.clone(),
            state: FormState {
                form_data,
                reference_data: self.state.reference_data.clone(),
                validation_errors: Vec::new(),
            },
        }
    }

    pub fn modification_risk(&self) -> RiskLevel {
        rules::calculate_modification_risk(&self.state.form_data, &self.original)
    }

    pub fn change_summary(&self) -> Vec<ChangeSummaryEntry> {
        rules::generate_change_summary(
            &self.state.form_data,
            &self.original,
            &self.state.reference_data.seed_types,
        )
    }

    pub fn recommended_actions(&self) -> Vec<String> {
        rules::recommended_actions(&self.state.form_data, &self.original)
    }

    pub fn is_ecosystem_change_unsafe(&self) -> bool {
        rules::is_ecosystem_change_unsafe(&self.state.form_data, &self.original)
    }

    pub fn to_update_request(&self) -> FormResult<UpdateContainerRequest> {
        let validation = self.validate_form();
        if !validation.is_valid {
            debug!(
                container_id = self.id,
                errors = validation.errors.len(),
                "refusing to build update request"
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

        Ok(UpdateContainerRequest {
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
            ecosystem_settings: data.ecosystem_settings,
            seed_type_ids: data.seed_types.clone(),
        })
    }
}

impl FormModel for EditFormModel {
    const TRACKS_BASELINE: bool = true;

    fn state(&self) -> &FormState {
        &self.state
    }

    fn with_state(&self, state: FormState) -> Self {
        Self {
            id: self.id,
            state,
            original: self.original.clone(),
            readonly: self.readonly,
        }
    }

    fn validate_form(&self) -> ValidationResult {
        let mut errors = rules::validate_form_data(&self.state.form_data, NamePolicy::RequiredOnly);
        errors.extend(rules::validate_container_edit(
            &self.state.form_data,
            &self.original,
        ));
        ValidationResult::from_errors(dedup_errors(errors))
    }

    fn is_field_readonly(&self, field: FormField) -> bool {
        match field {
            FormField::Name => self.readonly.name,
            FormField::EcosystemConnected => self.readonly.ecosystem_connected,
            _ => false,
        }
    }

    fn has_changes(&self) -> bool {
        !self.get_changed_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldUpdate;
    use crate::rules::{LOCATION_REQUIRED, VIRTUAL_TO_PHYSICAL};
    use crate::types::{
        ContainerStatus, EcosystemSettings, Location, Purpose, SeedType, ValidationError,
    };
    use chrono::Utc;

    fn seed(id: i64, name: &str) -> SeedType {
        SeedType {
            id,
            name: name.to_string(),
            variety: "Standard".to_string(),
            supplier: "Acme Seeds".to_string(),
            batch_id: format!("B-{id}"),
        }
    }

    fn container() -> Container {
        Container {
            id: 12,
            name: "North Bay".to_string(),
            tenant_id: 1,
            container_type: ContainerType::Physical,
            purpose: Purpose::Research,
            location: Some(Location::new("Oslo", "Norway", "Dock 4")),
            notes: "first install".to_string(),
            shadow_service_enabled: true,
            copied_environment_from: None,
            robotics_simulation_enabled: false,
            ecosystem_connected: false,
            ecosystem_settings: EcosystemSettings::neutral(),
            status: ContainerStatus::Active,
            seed_types: vec![seed(1, "Basil"), seed(2, "Kale")],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn model() -> EditFormModel {
        EditFormModel::from_container(&container(), ReferenceData::default())
    }

    #[test]
    fn test_fresh_model_has_no_changes() {
        let model = model();
        assert!(!model.has_changes());
        assert!(model.get_changed_fields().is_empty());
        assert_eq!(model.form_data().seed_types, vec![1, 2]);
        assert_eq!(model.modification_risk(), RiskLevel::Low);
    }

    #[test]
    fn test_single_change_is_detected() {
        let model = model().with_field(FieldUpdate::Notes("moved racks".to_string()));
        assert!(model.has_changes());
        assert_eq!(model.get_changed_fields(), vec![FormField::Notes]);
    }

    #[test]
    fn test_reverting_a_change_clears_it() {
        let model = model()
            .with_field(FieldUpdate::Purpose(Purpose::Production))
            .with_field(FieldUpdate::Purpose(Purpose::Research));
        assert!(!model.has_changes());
    }

    #[test]
    fn test_readonly_policy() {
        let model = model();
        assert!(model.is_field_readonly(FormField::Name));
        assert!(!model.is_field_readonly(FormField::EcosystemConnected));
        assert!(!model.is_field_readonly(FormField::Notes));

        let mut connected = container();
        connected.ecosystem_connected = true;
        let model = EditFormModel::from_container(&connected, ReferenceData::default());
        assert!(model.is_field_readonly(FormField::EcosystemConnected));
        assert!(model.to_edit_form_data().readonly.ecosystem_connected);
    }

    #[test]
    fn test_name_with_spaces_is_accepted_when_editing() {
        assert!(model().validate_form().is_valid);
    }

    #[test]
    fn test_virtual_to_physical_is_rejected() {
        let mut virtual_container = container();
        virtual_container.container_type = ContainerType::Virtual;
        virtual_container.location = None;

        let model = EditFormModel::from_container(&virtual_container, ReferenceData::default())
            .with_field(FieldUpdate::Type(ContainerType::Physical));

        let result = model.validate_form();
        assert!(!result.is_valid);
        assert!(result
            .errors
            .contains(&ValidationError::new("type", VIRTUAL_TO_PHYSICAL)));
        let location_errors = result
            .errors
            .iter()
            .filter(|e| e.message == LOCATION_REQUIRED)
            .count();
        assert_eq!(location_errors, 1);
    }

    #[test]
    fn test_update_request_shape() {
        let model = model().with_field(FieldUpdate::Notes("  moved racks ".to_string()));
        let request = model.to_update_request().unwrap();
        assert_eq!(request.notes, "moved racks");
        assert_eq!(request.seed_type_ids, vec![1, 2]);

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("name").is_none());
        assert!(json.get("ecosystem_connected").is_none());
        assert!(json.get("status").is_none());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_reset_restores_baseline() {
        let edited = model().with_form_data([
            FieldUpdate::Notes("moved racks".to_string()),
            FieldUpdate::SeedTypes(vec![]),
        ]);
        let edited = edited.with_validation_errors(edited.validate_form().errors);
        assert!(!edited.validation_errors().is_empty());

        let reset = edited.reset();
        assert!(!reset.has_changes());
        assert!(reset.validation_errors().is_empty());
        assert_eq!(reset.form_data(), edited.original_form_data());
    }

    #[test]
    fn test_commit_replaces_baseline() {
        let reference = ReferenceData {
            seed_types: vec![seed(1, "Basil")],
            ..Default::default()
        };
        let model = EditFormModel::from_container(&container(), reference.clone())
            .with_field(FieldUpdate::Notes("moved racks".to_string()));

        let mut saved = container();
        saved.notes = "moved racks".to_string();
        let committed = model.commit(&saved);

        assert!(!committed.has_changes());
        assert_eq!(committed.original_form_data().notes, "moved racks");
        assert_eq!(committed.reference_data(), &reference);
    }

    #[test]
    fn test_commit_keeps_ecosystem_connection() {
        let model = model().with_form_data([
            FieldUpdate::EcosystemConnected(true),
            FieldUpdate::EcosystemSettings(rules::environment_settings_for_purpose(
                Purpose::Research,
            )),
        ]);
        assert!(!model.is_field_readonly(FormField::EcosystemConnected));

        // The server's copy still reports the container as disconnected.
        let committed = model.commit(&container());

        assert!(committed.form_data().ecosystem_connected);
        assert_eq!(committed.original_form_data(), model.form_data());
        assert!(!committed.has_changes());
        assert!(committed.is_field_readonly(FormField::EcosystemConnected));
    }

    #[test]
    fn test_reordered_seed_types_are_not_a_change() {
        let model = model().with_field(FieldUpdate::SeedTypes(vec![2, 1]));
        assert!(!model.has_changes());
        assert!(model.get_changed_fields().is_empty());
        assert_eq!(model.modification_risk(), RiskLevel::Low);
    }

    #[test]
    fn test_change_summary_uses_catalog() {
        let reference = ReferenceData {
            seed_types: vec![seed(1, "Basil"), seed(2, "Kale"), seed(3, "Mint")],
            ..Default::default()
        };
        let model = EditFormModel::from_container(&container(), reference)
            .with_field(FieldUpdate::SeedTypes(vec![1, 3]));

        let summary = model.change_summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].old_value, "Basil, Kale");
        assert_eq!(summary[0].new_value, "Basil, Mint");
        assert_eq!(model.modification_risk(), RiskLevel::Medium);
    }
}
