//! Copy-on-write form models
//!
//! A form model is an immutable snapshot of one container form: the current
//! field values, the reference lists the form draws from and the last set
//! of validation errors. Every `with_*` method returns a new model, so a
//! caller can always hold on to the previous snapshot for comparison.
//!
//! Two variants exist:
//! - [`CreateFormModel`] starts from hardcoded defaults and has no baseline.
//! - [`EditFormModel`] is hydrated from a loaded container and tracks the
//!   server-confirmed baseline together with a readonly-field policy.

pub mod create;
pub mod edit;

pub use create::CreateFormModel;
pub use edit::EditFormModel;

use crate::field::{FieldUpdate, FormField};
use crate::rules;
use crate::types::{
    ContainerFormData, ContainerType, EcosystemSettings, ReferenceData, SeedType,
    ValidationError, ValidationResult,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Form is invalid: {} error(s)", .errors.len())]
    Invalid { errors: Vec<ValidationError> },

    #[error("Missing required field: {field}")]
    MissingField { field: FormField },
}

pub type FormResult<T> = Result<T, FormError>;

/// State shared by both form variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub form_data: ContainerFormData,
    pub reference_data: ReferenceData,
    pub validation_errors: Vec<ValidationError>,
}

pub trait FormModel: Clone + Send + Sync + 'static {
    /// Whether submission requires a difference from a server baseline.
    const TRACKS_BASELINE: bool;

    fn state(&self) -> &FormState;

    /// Returns a copy of this model carrying `state`.
    fn with_state(&self, state: FormState) -> Self;

    fn validate_form(&self) -> ValidationResult;

    fn is_field_readonly(&self, field: FormField) -> bool;

    fn has_changes(&self) -> bool;

    fn form_data(&self) -> &ContainerFormData {
        &self.state().form_data
    }

    fn reference_data(&self) -> &ReferenceData {
        &self.state().reference_data
    }

    fn validation_errors(&self) -> &[ValidationError] {
        &self.state().validation_errors
    }

    /// Applies each update in order. Cross-field invariants are left to the caller.
    fn with_form_data<I>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = FieldUpdate>,
    {
        let mut state = self.state().clone();
        for update in updates {
            update.apply(&mut state.form_data);
        }
        self.with_state(state)
    }

    fn with_field(&self, update: FieldUpdate) -> Self {
        self.with_form_data([update])
    }

    fn with_validation_errors(&self, errors: Vec<ValidationError>) -> Self {
        let mut state = self.state().clone();
        state.validation_errors = errors;
        self.with_state(state)
    }

    fn with_reference_data(&self, reference_data: ReferenceData) -> Self {
        let mut state = self.state().clone();
        state.reference_data = reference_data;
        self.with_state(state)
    }

    fn should_show_location(&self) -> bool {
        self.form_data().container_type == ContainerType::Physical
    }

    fn should_show_virtual_settings(&self) -> bool {
        self.form_data().container_type == ContainerType::Virtual
    }

    fn should_show_ecosystem_settings(&self) -> bool {
        self.form_data().ecosystem_connected
    }

    fn get_auto_selected_environments(&self) -> EcosystemSettings {
        rules::environment_settings_for_purpose(self.form_data().purpose)
    }

    fn errors_for(&self, field: FormField) -> Vec<&ValidationError> {
        self.validation_errors()
            .iter()
            .filter(|e| e.field == field.as_str())
            .collect()
    }

    fn selected_seed_types(&self) -> Vec<&SeedType> {
        let catalog = &self.reference_data().seed_types;
        self.form_data()
            .seed_types
            .iter()
            .filter_map(|id| catalog.iter().find(|s| s.id == *id))
            .collect()
    }

    fn get_selected_seed_types_display(&self) -> String {
        let selected = &self.form_data().seed_types;
        let Some(first_id) = selected.first() else {
            return "No seed types selected".to_string();
        };

        let first = self
            .reference_data()
            .seed_types
            .iter()
            .find(|s| s.id == *first_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Seed type #{first_id}"));

        match selected.len() {
            1 => first,
            n => format!("{} +{} more", first, n - 1),
        }
    }
}

/// Drops exact duplicates while keeping the first occurrence order.
pub(crate) fn dedup_errors(errors: Vec<ValidationError>) -> Vec<ValidationError> {
    let mut unique: Vec<ValidationError> = Vec::with_capacity(errors.len());
    for error in errors {
        if !unique.contains(&error) {
            unique.push(error);
        }
    }
    unique
}
