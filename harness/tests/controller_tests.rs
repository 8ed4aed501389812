use harness::controller::{NAME_TAKEN, SUBMIT_REJECTED};
use harness::{
    CreateFormController, EditFormController, FormEvent, InMemoryBackend, Operation,
    SubmitOutcome,
};
use model::prelude::*;
use model::rules;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn demo() -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::demo())
}

fn fast_config() -> FormConfig {
    FormConfig::default().with_debounce(Duration::from_millis(20))
}

async fn create_controller(backend: &Arc<InMemoryBackend>) -> CreateFormController {
    let mut controller = CreateFormController::new(backend.clone(), fast_config());
    controller.initialize_form().await;
    controller
}

async fn edit_controller(backend: &Arc<InMemoryBackend>, id: ContainerId) -> EditFormController {
    let mut controller = EditFormController::new(backend.clone(), fast_config(), id);
    controller.initialize_form().await;
    assert!(controller.load_error().is_none());
    controller
}

fn fill_valid_physical(controller: &mut CreateFormController, name: &str) {
    controller.update_form_field(FieldUpdate::Name(name.to_string()));
    controller.update_form_field(FieldUpdate::TenantId(Some(1)));
    controller.add_seed_type(1);
    controller.update_form_field(FieldUpdate::Location(Some(Location::new("X", "Y", "Z"))));
}

#[tokio::test]
async fn test_type_toggles_keep_type_invariants() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    controller.update_form_field(FieldUpdate::Location(Some(Location::new("Oslo", "Norway", "Dock 1"))));

    let sequence = [
        ContainerType::Virtual,
        ContainerType::Virtual,
        ContainerType::Physical,
        ContainerType::Virtual,
        ContainerType::Physical,
        ContainerType::Physical,
    ];
    for container_type in sequence {
        if controller.form_data().container_type == ContainerType::Virtual {
            controller.update_form_field(FieldUpdate::CopiedEnvironmentFrom(Some(2)));
            controller.update_form_field(FieldUpdate::RoboticsSimulationEnabled(true));
        }
        controller.toggle_container_type(container_type);

        let data = controller.form_data();
        assert_eq!(data.container_type, container_type);
        match data.container_type {
            ContainerType::Virtual => assert!(data.location.is_none()),
            ContainerType::Physical => {
                assert!(data.copied_environment_from.is_none());
                assert!(!data.robotics_simulation_enabled);
            }
        }
    }
}

#[tokio::test]
async fn test_disconnecting_resets_environments() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    controller.handle_purpose_change(Purpose::Production);
    controller.toggle_ecosystem_connection(true);
    assert!(controller.form_data().ecosystem_settings.uses_production_tier());

    controller.toggle_ecosystem_connection(false);
    let settings = controller.form_data().ecosystem_settings;
    assert_eq!(settings, EcosystemSettings::neutral());
    assert_eq!(settings.mbai.environment, MbaiEnvironment::Prod);
    assert_eq!(settings.fa.environment, FaEnvironment::Alpha);
    assert_eq!(settings.pya.environment, PyaEnvironment::Dev);
    assert_eq!(settings.aws.environment, AwsEnvironment::Dev);
}

#[test]
fn test_purpose_environments_are_deterministic() {
    for purpose in [Purpose::Development, Purpose::Research, Purpose::Production] {
        assert_eq!(
            rules::environment_settings_for_purpose(purpose),
            rules::environment_settings_for_purpose(purpose)
        );
    }
    let production = rules::environment_settings_for_purpose(Purpose::Production);
    assert_eq!(production.aws.environment, AwsEnvironment::Prod);
}

#[tokio::test]
async fn test_seed_type_set_semantics() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;

    controller.add_seed_type(3);
    controller.add_seed_type(3);
    assert_eq!(controller.form_data().seed_types, vec![3]);

    controller.remove_seed_type(7);
    assert_eq!(controller.form_data().seed_types, vec![3]);

    controller.remove_seed_type(3);
    assert!(controller.form_data().seed_types.is_empty());
}

#[tokio::test]
async fn test_connected_container_keeps_ecosystem_connection() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 2).await;
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    controller.subscribe(move |event, _| sink.lock().unwrap().push(event.clone()));

    let before = controller.form_data().ecosystem_settings;
    controller.toggle_ecosystem_connection(false);

    assert!(controller.form_data().ecosystem_connected);
    assert_eq!(controller.form_data().ecosystem_settings, before);
    assert!(!controller.has_changes());
    assert_eq!(
        *events.lock().unwrap(),
        vec![FormEvent::FieldIgnored {
            field: FormField::EcosystemConnected
        }]
    );
}

#[tokio::test]
async fn test_readonly_connection_skips_environment_rederivation() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 2).await;
    let before = controller.form_data().ecosystem_settings;

    controller.handle_purpose_change(Purpose::Development);
    assert_eq!(controller.form_data().purpose, Purpose::Development);
    assert_eq!(controller.form_data().ecosystem_settings, before);
}

#[tokio::test]
async fn test_name_is_readonly_in_edit_mode() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 1).await;

    controller.update_form_field(FieldUpdate::Name("renamed".to_string()));
    assert_eq!(controller.form_data().name, "north-bay-01");
    assert!(!controller.has_changes());
}

#[tokio::test]
async fn test_empty_create_form_reports_required_fields() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;

    let result = controller.validate_form();
    assert!(!result.is_valid);
    assert!(result.has_error_for("name"));
    assert!(result.has_error_for("tenantId"));
    assert!(result.has_error_for("seedTypes"));
    assert!(!result.has_error_for("purpose"));
    assert_eq!(controller.view_state().error_count, result.errors.len());
}

#[tokio::test]
async fn test_single_edit_is_the_only_change() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 1).await;
    assert!(!controller.has_changes());
    assert!(controller.get_changed_fields().is_empty());
    assert!(controller.view_state().submit_button_disabled);

    controller.update_form_field(FieldUpdate::Notes("Moved sensors".to_string()));
    assert!(controller.has_changes());
    assert_eq!(controller.get_changed_fields(), vec![FormField::Notes]);
    assert_eq!(controller.modification_risk(), RiskLevel::Low);
    assert!(!controller.view_state().submit_button_disabled);
}

#[tokio::test]
async fn test_create_physical_container() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    fill_valid_physical(&mut controller, "farm-1");

    assert!(controller.validate_form().is_valid);
    let request = controller.model().to_create_request().unwrap();
    assert_eq!(request.container_type, ContainerType::Physical);
    assert_eq!(request.seed_type_ids, vec![1]);
    assert_eq!(request.status, ContainerStatus::Created);

    let payload = serde_json::to_value(&request).unwrap();
    assert_eq!(payload["type"], "physical");
    assert_eq!(payload["seed_type_ids"], serde_json::json!([1]));

    let outcome = controller.submit_form().await.unwrap();
    let SubmitOutcome::Created(container) = outcome else {
        panic!("expected a created container, got {outcome:?}");
    };
    assert_eq!(container.name, "farm-1");
    assert_eq!(controller.form_data(), &ContainerFormData::default());
    assert_eq!(backend.containers().len(), 4);
}

#[tokio::test]
async fn test_switching_to_virtual_drops_location_errors() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    controller.update_form_field(FieldUpdate::Location(Some(Location::new("Oslo", "", ""))));
    assert!(controller.validate_form().has_error_for("location"));

    controller.toggle_container_type(ContainerType::Virtual);
    assert!(!controller.validate_form().has_error_for("location"));
    assert!(!controller.model().should_show_location());
    assert!(!controller.view_state().show_location);
    assert!(controller.view_state().show_virtual_settings);
}

#[tokio::test]
async fn test_development_purpose_corrects_environments() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    controller.toggle_ecosystem_connection(true);
    controller.update_form_field(FieldUpdate::EcosystemSettings(
        rules::environment_settings_for_purpose(Purpose::Production),
    ));
    assert_eq!(
        controller.form_data().ecosystem_settings.fa.environment,
        FaEnvironment::Prod
    );

    controller.handle_purpose_change(Purpose::Development);
    assert_eq!(
        controller.form_data().ecosystem_settings.fa.environment,
        FaEnvironment::Alpha
    );
}

#[tokio::test]
async fn test_virtual_to_physical_is_rejected() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 2).await;

    controller.toggle_container_type(ContainerType::Physical);
    let result = controller.validate_form();
    assert!(result
        .errors
        .iter()
        .any(|e| e.field == "type" && e.message == rules::VIRTUAL_TO_PHYSICAL));

    let err = controller.submit_form().await.unwrap_err();
    assert!(matches!(err, FormError::Invalid { .. }));
    assert_eq!(backend.call_count(Operation::UpdateContainer), 0);
}

#[tokio::test]
async fn test_too_many_seed_types() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    for id in 1..=11 {
        controller.add_seed_type(id);
    }

    assert!(!rules::is_valid_seed_type_selection(&controller.form_data().seed_types));
    let result = controller.validate_form();
    assert!(result
        .errors
        .iter()
        .any(|e| e.field == "seedTypes" && e.message == rules::SEED_TYPES_TOO_MANY));
    assert_eq!(
        controller.model().get_selected_seed_types_display(),
        "Basil +10 more"
    );
}

#[tokio::test]
async fn test_backend_rejection_is_merged_into_errors() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    fill_valid_physical(&mut controller, "north-bay-01");

    let outcome = controller.submit_form().await.unwrap();
    let SubmitOutcome::Rejected { errors } = outcome else {
        panic!("expected a rejection, got {outcome:?}");
    };
    assert_eq!(errors[0].field, "name");
    assert!(controller.validation_errors().iter().any(|e| e.field == "name"));
    assert_eq!(
        controller.view_state().submit_error.as_deref(),
        Some(SUBMIT_REJECTED)
    );
    assert_eq!(controller.form_data().name, "north-bay-01");
    assert!(!controller.is_submitting());
}

#[tokio::test]
async fn test_network_failure_keeps_entered_data() {
    let backend = demo();
    backend.fail(
        Operation::CreateContainer,
        BackendError::Network {
            message: "connection refused".to_string(),
        },
    );
    let mut controller = create_controller(&backend).await;
    fill_valid_physical(&mut controller, "farm-2");

    let outcome = controller.submit_form().await.unwrap();
    let SubmitOutcome::Failed { message } = outcome else {
        panic!("expected a failure, got {outcome:?}");
    };
    assert!(message.contains("connection refused"));
    assert_eq!(controller.form_data().name, "farm-2");
    assert_eq!(controller.view_state().submit_button_label, "Create Container");
    assert!(!controller.view_state().submit_button_disabled);
}

#[tokio::test]
async fn test_locked_container_blocks_submit() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 3).await;
    assert!(!controller.can_modify());

    controller.update_form_field(FieldUpdate::Notes("Extra lights".to_string()));
    assert!(controller.view_state().submit_button_disabled);

    let outcome = controller.submit_form().await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            message: "Container is in an active harvest cycle".to_string()
        }
    );
    assert_eq!(backend.call_count(Operation::UpdateContainer), 0);
}

#[tokio::test]
async fn test_update_commits_new_baseline() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 1).await;
    controller.add_seed_type(4);
    assert_eq!(controller.modification_risk(), RiskLevel::Medium);

    let summary = controller.change_summary();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].field, FormField::SeedTypes);

    let outcome = controller.submit_form().await.unwrap();
    let SubmitOutcome::Updated(container) = outcome else {
        panic!("expected an update, got {outcome:?}");
    };
    assert_eq!(container.seed_types.len(), 3);
    assert_eq!(container.name, "north-bay-01");
    assert!(!controller.has_changes());
    assert_eq!(controller.view_state().submit_button_label, "Save Changes");
}

#[tokio::test]
async fn test_connecting_ecosystem_survives_save() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 1).await;
    controller.toggle_ecosystem_connection(true);
    assert_eq!(controller.modification_risk(), RiskLevel::High);
    let submitted = controller.form_data().clone();

    let outcome = controller.submit_form().await.unwrap();
    assert!(outcome.is_success());

    assert!(controller.form_data().ecosystem_connected);
    assert_eq!(controller.model().original_form_data(), &submitted);
    assert!(!controller.has_changes());
    assert!(controller.view_state().submit_button_disabled);

    controller.toggle_ecosystem_connection(false);
    assert!(controller.form_data().ecosystem_connected);
}

#[tokio::test]
async fn test_reordering_seed_types_is_not_a_change() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 1).await;

    controller.remove_seed_type(1);
    controller.add_seed_type(1);
    assert_eq!(controller.form_data().seed_types, vec![2, 1]);

    assert!(!controller.has_changes());
    assert!(controller.get_changed_fields().is_empty());
    assert_eq!(controller.modification_risk(), RiskLevel::Low);
    assert!(controller.view_state().submit_button_disabled);
    assert_eq!(
        controller.submit_form().await.unwrap(),
        SubmitOutcome::NoChanges
    );
}

#[tokio::test]
async fn test_unchanged_edit_form_sends_nothing() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 1).await;

    let outcome = controller.submit_form().await.unwrap();
    assert_eq!(outcome, SubmitOutcome::NoChanges);
    assert!(!outcome.is_success());
    assert_eq!(backend.call_count(Operation::UpdateContainer), 0);
}

#[tokio::test]
async fn test_switch_to_virtual_recommends_archiving() {
    let backend = demo();
    let mut controller = edit_controller(&backend, 1).await;
    controller.toggle_container_type(ContainerType::Virtual);

    assert_eq!(controller.modification_risk(), RiskLevel::High);
    let actions = controller.recommended_actions();
    assert!(actions.iter().any(|a| a.contains("Archive sensor data")));
    assert!(actions.iter().any(|a| a.contains("outside of an active growing cycle")));

    controller.reset_form();
    assert!(!controller.has_changes());
    assert_eq!(controller.form_data().container_type, ContainerType::Physical);
}

#[tokio::test]
async fn test_listeners_see_load_and_submit_events() {
    let backend = demo();
    let mut controller = CreateFormController::new(backend.clone(), fast_config());
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let id = controller.subscribe(move |event, view| {
        sink.lock().unwrap().push((event.clone(), view.is_submitting));
    });

    controller.initialize_form().await;
    fill_valid_physical(&mut controller, "farm-3");
    controller.submit_form().await.unwrap();

    {
        let events = events.lock().unwrap();
        assert_eq!(events[0], (FormEvent::LoadStarted, false));
        assert_eq!(events[1], (FormEvent::Loaded, false));
        assert!(events.contains(&(FormEvent::SubmitStarted, true)));
        assert_eq!(events.last(), Some(&(FormEvent::Submitted, false)));
    }

    assert!(controller.unsubscribe(id));
    let seen = events.lock().unwrap().len();
    controller.reset_form();
    assert_eq!(events.lock().unwrap().len(), seen);
}

#[tokio::test]
async fn test_stale_seed_search_is_discarded() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    assert_eq!(controller.search_results().len(), 12);

    controller.search_seed_types("ba");
    controller.search_seed_types("kale");
    assert!(controller.settle_seed_search().await);

    let names: Vec<&str> = controller
        .search_results()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["Kale"]);
    assert_eq!(backend.call_count(Operation::ListSeedTypes), 2);
}

#[tokio::test]
async fn test_short_search_restores_full_list() {
    let backend = demo();
    let mut controller =
        CreateFormController::new(backend.clone(), fast_config().with_min_search_chars(3));
    controller.initialize_form().await;

    controller.search_seed_types("kale");
    assert!(controller.settle_seed_search().await);
    assert_eq!(controller.search_results().len(), 1);

    controller.search_seed_types("ka");
    assert_eq!(controller.search_results().len(), 12);
    assert!(!controller.settle_seed_search().await);
}

#[tokio::test]
async fn test_taken_name_blocks_until_changed() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;
    fill_valid_physical(&mut controller, "north-bay-01");

    controller.check_container_name("north-bay-01");
    let validation = controller.settle_name_check().await.unwrap();
    assert!(!validation.is_valid);
    assert_eq!(validation.suggestions[0], "north-bay-01-2");

    let name_error = controller
        .validation_errors()
        .iter()
        .find(|e| e.field == "name")
        .unwrap();
    assert!(name_error.message.starts_with(NAME_TAKEN));
    assert!(name_error.message.contains("north-bay-01-2"));
    assert!(controller.view_state().submit_button_disabled);

    controller.update_form_field(FieldUpdate::Name("north-bay-02".to_string()));
    assert!(controller.validate_form().is_valid);
    assert!(!controller.view_state().submit_button_disabled);
}

#[tokio::test]
async fn test_superseded_name_check_only_reports_latest() {
    let backend = demo();
    let mut controller = create_controller(&backend).await;

    controller.check_container_name("north-bay-01");
    controller.check_container_name("fresh-name");
    let validation = controller.settle_name_check().await.unwrap();
    assert!(validation.is_valid);
    assert_eq!(backend.call_count(Operation::ValidateContainerName), 1);
}

#[tokio::test]
async fn test_failed_name_check_is_not_fatal() {
    let backend = demo();
    backend.fail(
        Operation::ValidateContainerName,
        BackendError::Network {
            message: "timeout".to_string(),
        },
    );
    let mut controller = create_controller(&backend).await;
    fill_valid_physical(&mut controller, "farm-5");

    controller.check_container_name("farm-5");
    assert!(controller.settle_name_check().await.is_none());
    assert!(controller.name_validation().is_none());
    assert!(controller.validate_form().is_valid);
}
