use super::{fetch_reference_data, FormController, FormEvent, SubmitOutcome};
use model::prelude::*;
use std::sync::Arc;
use tracing::info;

pub type CreateFormController = FormController<CreateFormModel>;

impl FormController<CreateFormModel> {
    pub fn new(backend: Arc<dyn ContainerBackend>, config: FormConfig) -> Self {
        Self::with_model(CreateFormModel::new(), backend, config, true)
    }

    /// Loads the reference lists. Failures leave the affected list empty.
    pub async fn initialize_form(&mut self) {
        self.begin_loading();

        let reference_data = fetch_reference_data(self.backend.as_ref(), None).await;
        info!(
            tenants = reference_data.tenants.len(),
            seed_types = reference_data.seed_types.len(),
            "create form reference data loaded"
        );
        self.search_results = reference_data.seed_types.clone();
        self.model = self.model.with_reference_data(reference_data);
        self.is_loading = false;
        self.refresh_view();
        self.notify(FormEvent::Loaded);
    }

    /// Sends the form to the backend.
    ///
    /// Returns `Err(FormError::Invalid)` without contacting the backend when
    /// local validation fails; every backend outcome is an `Ok` value.
    pub async fn submit_form(&mut self) -> FormResult<SubmitOutcome> {
        let request = match self.model.to_create_request() {
            Ok(request) => request,
            Err(err) => return Err(self.reject_locally(err)),
        };

        self.begin_submitting();
        let result = self.backend.create_container(request).await;

        match result {
            Ok(container) => {
                info!(container_id = container.id, name = %container.name, "container created");
                self.is_submitting = false;
                self.clear_lookups();
                self.model = self.model.reset();
                self.refresh_view();
                self.notify(FormEvent::Submitted);
                Ok(SubmitOutcome::Created(container))
            }
            Err(err) => Ok(self.apply_submit_error(err)),
        }
    }

    /// Back to the hardcoded defaults; reference lists stay loaded.
    pub fn reset_form(&mut self) {
        self.clear_lookups();
        self.submit_error = None;
        self.model = self.model.reset();
        self.refresh_view();
        self.notify(FormEvent::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryBackend, Operation};

    fn backend() -> Arc<InMemoryBackend> {
        Arc::new(InMemoryBackend::demo())
    }

    #[tokio::test]
    async fn test_initialize_loads_reference_data() {
        let mut controller = CreateFormController::new(backend(), FormConfig::default());
        controller.initialize_form().await;

        assert!(!controller.is_loading());
        assert!(!controller.reference_data().tenants.is_empty());
        assert!(!controller.reference_data().seed_types.is_empty());
        assert_eq!(controller.view_state().submit_button_label, "Create Container");
        assert!(controller.view_state().submit_button_disabled);
    }

    #[tokio::test]
    async fn test_partial_reference_failure_degrades_to_empty() {
        let backend = backend();
        backend.fail(
            Operation::ListTenants,
            BackendError::Network {
                message: "connection reset".to_string(),
            },
        );

        let mut controller = CreateFormController::new(backend, FormConfig::default());
        controller.initialize_form().await;

        assert!(!controller.is_loading());
        assert!(controller.load_error().is_none());
        assert!(controller.reference_data().tenants.is_empty());
        assert!(!controller.reference_data().seed_types.is_empty());
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let mut controller = CreateFormController::new(backend(), FormConfig::default());
        controller.update_form_field(FieldUpdate::Name("farm-9".to_string()));
        controller.add_seed_type(2);
        assert!(controller.view_state().has_changes);

        controller.reset_form();
        assert_eq!(controller.form_data(), &ContainerFormData::default());
        assert!(!controller.view_state().has_changes);
    }
}
