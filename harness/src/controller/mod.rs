//! Form controllers
//!
//! A controller owns the current form model and swaps it for a new snapshot
//! on every action. Reference data, submission and the debounced name and
//! seed-type lookups go through a [`ContainerBackend`]; every backend
//! failure is turned into controller state rather than escaping.
//!
//! The controller is driven from a single logical thread: actions take
//! `&mut self`, so overlapping invocations of the same action cannot occur.
//! Listeners are notified synchronously after each action completes.

pub mod create;
pub mod edit;

pub use create::CreateFormController;
pub use edit::EditFormController;

use crate::debounce::Debounced;
use crate::listeners::{Listener, ListenerRegistry, SubscriptionId};
use model::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const NAME_TAKEN: &str = "Container name is already taken";
pub const SUBMIT_REJECTED: &str = "Please correct the highlighted fields";

/// Labels and behaviour that differ between the create and edit flows.
pub trait FormMode: FormModel {
    const SUBMIT_LABEL: &'static str;
    const SUBMITTING_LABEL: &'static str;
}

impl FormMode for CreateFormModel {
    const SUBMIT_LABEL: &'static str = "Create Container";
    const SUBMITTING_LABEL: &'static str = "Creating...";
}

impl FormMode for EditFormModel {
    const SUBMIT_LABEL: &'static str = "Save Changes";
    const SUBMITTING_LABEL: &'static str = "Saving...";
}

/// What the UI needs to render besides the field values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub show_location: bool,
    pub show_virtual_settings: bool,
    pub show_ecosystem_settings: bool,
    pub submit_button_label: String,
    pub submit_button_disabled: bool,
    pub is_loading: bool,
    pub is_submitting: bool,
    pub has_changes: bool,
    pub can_modify: bool,
    pub load_error: Option<String>,
    pub submit_error: Option<String>,
    pub error_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    LoadStarted,
    Loaded,
    LoadFailed { message: String },
    FieldUpdated { field: FormField },
    FieldIgnored { field: FormField },
    TypeToggled { container_type: ContainerType },
    EcosystemToggled { connected: bool },
    SeedTypeAdded { id: SeedTypeId },
    SeedTypeRemoved { id: SeedTypeId },
    PurposeChanged { purpose: Purpose },
    Validated { is_valid: bool },
    SubmitStarted,
    Submitted,
    SubmitRejected { errors: usize },
    SubmitFailed { message: String },
    Reset,
    SearchCompleted { results: usize },
    NameChecked { is_valid: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Container),
    Updated(Container),
    /// Edit form matched its baseline; nothing was sent.
    NoChanges,
    /// The backend rejected specific fields; they were merged into the form errors.
    Rejected { errors: Vec<ValidationError> },
    Failed { message: String },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Created(_) | SubmitOutcome::Updated(_))
    }
}

pub struct FormController<M: FormMode> {
    model: M,
    backend: Arc<dyn ContainerBackend>,
    config: FormConfig,
    /// False for an edit form whose container has not loaded yet.
    hydrated: bool,
    is_loading: bool,
    is_submitting: bool,
    load_error: Option<String>,
    submit_error: Option<String>,
    permission: ModifyPermission,
    view: ViewState,
    listeners: ListenerRegistry,
    seed_search: Debounced<BackendResult<Vec<SeedType>>>,
    name_check: Debounced<(String, BackendResult<NameValidation>)>,
    search_results: Vec<SeedType>,
    name_validation: Option<(String, NameValidation)>,
}

impl<M: FormMode> FormController<M> {
    fn with_model(
        model: M,
        backend: Arc<dyn ContainerBackend>,
        config: FormConfig,
        hydrated: bool,
    ) -> Self {
        let mut controller = Self {
            seed_search: Debounced::new(config.seed_search_debounce),
            name_check: Debounced::new(config.name_check_debounce),
            model,
            backend,
            config,
            hydrated,
            is_loading: false,
            is_submitting: false,
            load_error: None,
            submit_error: None,
            permission: ModifyPermission::allowed(),
            view: ViewState::default(),
            listeners: ListenerRegistry::new(),
            search_results: Vec::new(),
            name_validation: None,
        };
        controller.refresh_view();
        controller
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn form_data(&self) -> &ContainerFormData {
        self.model.form_data()
    }

    pub fn reference_data(&self) -> &ReferenceData {
        self.model.reference_data()
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        self.model.validation_errors()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn search_results(&self) -> &[SeedType] {
        &self.search_results
    }

    pub fn name_validation(&self) -> Option<&NameValidation> {
        self.name_validation.as_ref().map(|(_, validation)| validation)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&FormEvent, &ViewState) + Send + Sync + 'static,
    {
        let listener: Listener = Box::new(listener);
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Sets one field. Readonly fields and unloaded forms ignore the update.
    pub fn update_form_field(&mut self, update: FieldUpdate) {
        let field = update.field();
        if !self.accepts(field) {
            self.notify(FormEvent::FieldIgnored { field });
            return;
        }
        self.replace_model(self.model.with_field(update));
        self.notify(FormEvent::FieldUpdated { field });
    }

    /// Sets the type, then clears whatever the new type does not allow.
    pub fn toggle_container_type(&mut self, container_type: ContainerType) {
        if !self.accepts(FormField::Type) {
            self.notify(FormEvent::FieldIgnored {
                field: FormField::Type,
            });
            return;
        }

        let typed = self.model.with_field(FieldUpdate::Type(container_type));
        let cleared = match typed.form_data().container_type {
            ContainerType::Virtual => typed.with_field(FieldUpdate::Location(None)),
            ContainerType::Physical => typed.with_form_data([
                FieldUpdate::CopiedEnvironmentFrom(None),
                FieldUpdate::RoboticsSimulationEnabled(false),
            ]),
        };
        self.replace_model(cleared);
        self.notify(FormEvent::TypeToggled { container_type });
    }

    pub fn toggle_ecosystem_connection(&mut self, connected: bool) {
        if !self.accepts(FormField::EcosystemConnected) {
            debug!(connected, "ecosystem connection is readonly");
            self.notify(FormEvent::FieldIgnored {
                field: FormField::EcosystemConnected,
            });
            return;
        }

        let toggled = self
            .model
            .with_field(FieldUpdate::EcosystemConnected(connected));
        let settings = if connected {
            toggled.get_auto_selected_environments()
        } else {
            EcosystemSettings::neutral()
        };
        self.replace_model(toggled.with_field(FieldUpdate::EcosystemSettings(settings)));
        self.notify(FormEvent::EcosystemToggled { connected });
    }

    pub fn add_seed_type(&mut self, id: SeedTypeId) {
        if !self.accepts(FormField::SeedTypes) {
            self.notify(FormEvent::FieldIgnored {
                field: FormField::SeedTypes,
            });
            return;
        }

        let selected = &self.model.form_data().seed_types;
        if !selected.contains(&id) {
            let mut seed_types = selected.clone();
            seed_types.push(id);
            self.replace_model(self.model.with_field(FieldUpdate::SeedTypes(seed_types)));
        }
        self.notify(FormEvent::SeedTypeAdded { id });
    }

    pub fn remove_seed_type(&mut self, id: SeedTypeId) {
        if !self.accepts(FormField::SeedTypes) {
            self.notify(FormEvent::FieldIgnored {
                field: FormField::SeedTypes,
            });
            return;
        }

        let selected = &self.model.form_data().seed_types;
        if selected.contains(&id) {
            let seed_types = selected.iter().copied().filter(|s| *s != id).collect();
            self.replace_model(self.model.with_field(FieldUpdate::SeedTypes(seed_types)));
        }
        self.notify(FormEvent::SeedTypeRemoved { id });
    }

    /// Sets the purpose and re-derives ecosystem environments while connected.
    pub fn handle_purpose_change(&mut self, purpose: Purpose) {
        if !self.accepts(FormField::Purpose) {
            self.notify(FormEvent::FieldIgnored {
                field: FormField::Purpose,
            });
            return;
        }

        let mut updated = self.model.with_field(FieldUpdate::Purpose(purpose));
        if updated.form_data().ecosystem_connected
            && !updated.is_field_readonly(FormField::EcosystemConnected)
        {
            let settings = updated.get_auto_selected_environments();
            updated = updated.with_field(FieldUpdate::EcosystemSettings(settings));
        }
        self.replace_model(updated);
        self.notify(FormEvent::PurposeChanged { purpose });
    }

    /// Recomputes and stores the full error set.
    pub fn validate_form(&mut self) -> ValidationResult {
        let mut errors = self.model.validate_form().errors;
        if let Some(conflict) = self.name_conflict() {
            errors.push(conflict);
        }
        let result = ValidationResult::from_errors(errors);

        self.model = self.model.with_validation_errors(result.errors.clone());
        self.refresh_view_with(result.is_valid);
        self.notify(FormEvent::Validated {
            is_valid: result.is_valid,
        });
        result
    }

    /// Starts a debounced seed-type search; call [`Self::settle_seed_search`] for the result.
    pub fn search_seed_types(&mut self, query: &str) {
        let query = query.trim().to_string();
        if query.chars().count() < self.config.min_search_chars {
            self.seed_search.cancel();
            self.search_results = self.model.reference_data().seed_types.clone();
            self.notify(FormEvent::SearchCompleted {
                results: self.search_results.len(),
            });
            return;
        }

        let backend = Arc::clone(&self.backend);
        let id = self.seed_search.schedule(async move {
            let search = if query.is_empty() {
                None
            } else {
                Some(query.as_str())
            };
            backend.list_seed_types(search).await
        });
        debug!(request = id.value(), "seed type search scheduled");
    }

    /// Applies the newest search result. Returns false if nothing current arrived.
    pub async fn settle_seed_search(&mut self) -> bool {
        match self.seed_search.settle().await {
            Some(Ok(results)) => {
                self.search_results = results;
                self.notify(FormEvent::SearchCompleted {
                    results: self.search_results.len(),
                });
                true
            }
            Some(Err(err)) => {
                warn!(error = %err, "seed type search failed");
                false
            }
            None => false,
        }
    }

    /// Starts a debounced name-uniqueness check; call [`Self::settle_name_check`] for the result.
    pub fn check_container_name(&mut self, name: &str) {
        if self.model.is_field_readonly(FormField::Name) {
            self.notify(FormEvent::FieldIgnored {
                field: FormField::Name,
            });
            return;
        }

        let name = name.trim().to_string();
        let backend = Arc::clone(&self.backend);
        let id = self.name_check.schedule(async move {
            let result = backend.validate_container_name(&name).await;
            (name, result)
        });
        debug!(request = id.value(), "name check scheduled");
    }

    pub async fn settle_name_check(&mut self) -> Option<NameValidation> {
        let (name, result) = self.name_check.settle().await?;
        match result {
            Ok(validation) => {
                self.name_validation = Some((name, validation.clone()));

                let mut errors: Vec<ValidationError> = self
                    .model
                    .validation_errors()
                    .iter()
                    .filter(|e| !e.message.starts_with(NAME_TAKEN))
                    .cloned()
                    .collect();
                if let Some(conflict) = self.name_conflict() {
                    errors.push(conflict);
                }
                self.model = self.model.with_validation_errors(errors);
                self.refresh_view();
                self.notify(FormEvent::NameChecked {
                    is_valid: validation.is_valid,
                });
                Some(validation)
            }
            Err(err) => {
                warn!(error = %err, name = %name, "name check failed");
                None
            }
        }
    }

    /// A `name` error if the backend reported the current name as taken.
    fn name_conflict(&self) -> Option<ValidationError> {
        let (checked, validation) = self.name_validation.as_ref()?;
        if validation.is_valid || checked != self.model.form_data().name.trim() {
            return None;
        }

        let message = if validation.suggestions.is_empty() {
            NAME_TAKEN.to_string()
        } else {
            format!("{}. Try: {}", NAME_TAKEN, validation.suggestions.join(", "))
        };
        Some(ValidationError::new(FormField::Name.as_str(), message))
    }

    fn accepts(&self, field: FormField) -> bool {
        self.hydrated && !self.model.is_field_readonly(field)
    }

    fn replace_model(&mut self, model: M) {
        self.model = model;
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        let is_valid = self.model.validate_form().is_valid && self.name_conflict().is_none();
        self.refresh_view_with(is_valid);
    }

    fn refresh_view_with(&mut self, is_valid: bool) {
        let has_changes = self.model.has_changes();
        let blocked_by_baseline = M::TRACKS_BASELINE && !has_changes;

        self.view = ViewState {
            show_location: self.model.should_show_location(),
            show_virtual_settings: self.model.should_show_virtual_settings(),
            show_ecosystem_settings: self.model.should_show_ecosystem_settings(),
            submit_button_label: if self.is_submitting {
                M::SUBMITTING_LABEL
            } else {
                M::SUBMIT_LABEL
            }
            .to_string(),
            submit_button_disabled: !is_valid
                || blocked_by_baseline
                || self.is_submitting
                || !self.hydrated
                || !self.permission.can_modify,
            is_loading: self.is_loading,
            is_submitting: self.is_submitting,
            has_changes,
            can_modify: self.permission.can_modify,
            load_error: self.load_error.clone(),
            submit_error: self.submit_error.clone(),
            error_count: self.model.validation_errors().len(),
        };
    }

    fn notify(&self, event: FormEvent) {
        self.listeners.notify(&event, &self.view);
    }

    fn begin_loading(&mut self) {
        self.is_loading = true;
        self.load_error = None;
        self.refresh_view();
        self.notify(FormEvent::LoadStarted);
    }

    fn begin_submitting(&mut self) {
        self.is_submitting = true;
        self.submit_error = None;
        self.refresh_view();
        self.notify(FormEvent::SubmitStarted);
    }

    /// Stores the local validation errors that stopped a submission.
    fn reject_locally(&mut self, err: FormError) -> FormError {
        if let FormError::Invalid { errors } = &err {
            self.model = self.model.with_validation_errors(errors.clone());
            self.refresh_view_with(false);
            self.notify(FormEvent::Validated { is_valid: false });
        }
        err
    }

    /// Turns a failed create or update into state, keeping the entered data.
    fn apply_submit_error(&mut self, err: BackendError) -> SubmitOutcome {
        self.is_submitting = false;

        if let BackendError::Validation { errors } = err {
            warn!(errors = errors.len(), "backend rejected submission");
            let mut merged = self.model.validation_errors().to_vec();
            for error in &errors {
                if !merged.contains(error) {
                    merged.push(error.clone());
                }
            }
            self.model = self.model.with_validation_errors(merged);
            self.submit_error = Some(SUBMIT_REJECTED.to_string());
            self.refresh_view();
            self.notify(FormEvent::SubmitRejected {
                errors: errors.len(),
            });
            return SubmitOutcome::Rejected { errors };
        }

        error!(error = %err, "submission failed");
        let message = err.to_string();
        self.submit_error = Some(message.clone());
        self.refresh_view();
        self.notify(FormEvent::SubmitFailed {
            message: message.clone(),
        });
        SubmitOutcome::Failed { message }
    }

    fn clear_lookups(&mut self) {
        self.name_check.cancel();
        self.seed_search.cancel();
        self.name_validation = None;
    }
}

/// Loads tenants, seed types and available containers concurrently.
///
/// A failed list degrades to empty and is logged; it never fails the load.
pub async fn fetch_reference_data(
    backend: &dyn ContainerBackend,
    exclude_id: Option<ContainerId>,
) -> ReferenceData {
    let (tenants, seed_types, available_containers) = tokio::join!(
        backend.list_tenants(),
        backend.list_seed_types(None),
        backend.list_available_containers(exclude_id),
    );

    ReferenceData {
        tenants: tenants.unwrap_or_else(|err| {
            warn!(error = %err, "failed to load tenants");
            Vec::new()
        }),
        seed_types: seed_types.unwrap_or_else(|err| {
            warn!(error = %err, "failed to load seed types");
            Vec::new()
        }),
        available_containers: available_containers.unwrap_or_else(|err| {
            warn!(error = %err, "failed to load available containers");
            Vec::new()
        }),
    }
}
