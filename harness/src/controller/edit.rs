use super::{fetch_reference_data, FormController, FormEvent, SubmitOutcome};
use model::prelude::*;
use std::sync::Arc;
use tracing::{error, info, warn};

pub type EditFormController = FormController<EditFormModel>;

impl FormController<EditFormModel> {
    /// A controller for `container_id`; nothing is editable until it loads.
    pub fn new(
        backend: Arc<dyn ContainerBackend>,
        config: FormConfig,
        container_id: ContainerId,
    ) -> Self {
        Self::with_model(EditFormModel::unloaded(container_id), backend, config, false)
    }

    pub fn container_id(&self) -> ContainerId {
        self.model.id()
    }

    pub fn can_modify(&self) -> bool {
        self.permission.can_modify
    }

    /// Loads the container, its modify permission and the reference lists
    /// concurrently. Only a failure to load the container itself blocks the form.
    pub async fn initialize_form(&mut self) {
        self.begin_loading();

        let id = self.model.id();
        let backend = self.backend.as_ref();
        let (reference_data, container, permission) = tokio::join!(
            fetch_reference_data(backend, Some(id)),
            backend.load_container(id),
            backend.can_modify_container(id),
        );

        self.permission = permission.unwrap_or_else(|err| {
            warn!(container_id = id, error = %err, "failed to check modify permission");
            ModifyPermission::allowed()
        });

        let event = match container {
            Ok(container) => {
                info!(container_id = id, name = %container.name, "container loaded for editing");
                self.model = EditFormModel::from_container(&container, reference_data);
                self.hydrated = true;
                FormEvent::Loaded
            }
            Err(err) => {
                error!(container_id = id, error = %err, "failed to load container");
                let message = format!("Failed to load container: {err}");
                self.load_error = Some(message.clone());
                self.model = self.model.with_reference_data(reference_data);
                FormEvent::LoadFailed { message }
            }
        };

        self.search_results = self.model.reference_data().seed_types.clone();
        self.is_loading = false;
        self.refresh_view();
        self.notify(event);
    }

    /// Sends the changed form to the backend and commits the returned state
    /// as the new baseline.
    ///
    /// Returns `Err(FormError::Invalid)` without contacting the backend when
    /// local validation fails; every backend outcome is an `Ok` value.
    pub async fn submit_form(&mut self) -> FormResult<SubmitOutcome> {
        if !self.hydrated {
            let message = self
                .load_error
                .clone()
                .unwrap_or_else(|| "Container has not been loaded".to_string());
            self.notify(FormEvent::SubmitFailed {
                message: message.clone(),
            });
            return Ok(SubmitOutcome::Failed { message });
        }

        if !self.model.has_changes() {
            self.notify(FormEvent::Submitted);
            return Ok(SubmitOutcome::NoChanges);
        }

        if !self.permission.can_modify {
            let message = self
                .permission
                .reason
                .clone()
                .unwrap_or_else(|| "You do not have permission to modify this container".to_string());
            warn!(container_id = self.model.id(), reason = %message, "submission blocked");
            self.submit_error = Some(message.clone());
            self.refresh_view();
            self.notify(FormEvent::SubmitFailed {
                message: message.clone(),
            });
            return Ok(SubmitOutcome::Failed { message });
        }

        let request = match self.model.to_update_request() {
            Ok(request) => request,
            Err(err) => return Err(self.reject_locally(err)),
        };

        info!(
            container_id = self.model.id(),
            risk = ?self.model.modification_risk(),
            changed = ?self.model.get_changed_fields(),
            "submitting container update"
        );

        self.begin_submitting();
        let result = self
            .backend
            .update_container(self.model.id(), request)
            .await;

        match result {
            Ok(container) => {
                info!(container_id = container.id, "container updated");
                self.is_submitting = false;
                self.model = self.model.commit(&container);
                self.refresh_view();
                self.notify(FormEvent::Submitted);
                Ok(SubmitOutcome::Updated(container))
            }
            Err(err) => Ok(self.apply_submit_error(err)),
        }
    }

    /// Discards local edits, keeping the baseline and reference lists.
    pub fn reset_form(&mut self) {
        self.clear_lookups();
        self.submit_error = None;
        self.model = self.model.reset();
        self.refresh_view();
        self.notify(FormEvent::Reset);
    }

    pub fn has_changes(&self) -> bool {
        self.model.has_changes()
    }

    pub fn get_changed_fields(&self) -> Vec<FormField> {
        self.model.get_changed_fields()
    }

    pub fn change_summary(&self) -> Vec<ChangeSummaryEntry> {
        self.model.change_summary()
    }

    pub fn modification_risk(&self) -> RiskLevel {
        self.model.modification_risk()
    }

    pub fn recommended_actions(&self) -> Vec<String> {
        self.model.recommended_actions()
    }
}
