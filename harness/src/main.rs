use clap::{Args, Parser, Subcommand};
use harness::{
    CreateFormController, EditFormController, Fixture, FormController, FormEvent, FormMode,
    InMemoryBackend, SubmitOutcome,
};
use model::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "harness")]
#[command(about = "Drive the container create and edit forms against a local backend")]
struct Cli {
    /// TOML fixture with tenants, seed types and containers (defaults to built-in demo data)
    #[arg(short, long, global = true)]
    fixture: Option<PathBuf>,

    /// Print every form event as it happens
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in and submit the create form
    Create(CreateArgs),
    /// Load a container, apply changes and save them
    Edit(EditArgs),
    /// Show the ecosystem environments a purpose selects
    Environments {
        /// development, research or production
        purpose: String,
    },
    /// List the containers the backend knows about
    Containers,
}

#[derive(Args)]
struct CreateArgs {
    #[arg(short, long)]
    name: String,
    #[arg(short, long)]
    tenant: Option<TenantId>,
    #[arg(long = "type", default_value = "physical", value_parser = parse_container_type)]
    container_type: ContainerType,
    #[arg(short, long, default_value = "development", value_parser = parse_purpose)]
    purpose: Purpose,
    /// Seed type id; repeat for several
    #[arg(short, long = "seed")]
    seeds: Vec<SeedTypeId>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    shadow_service: bool,
    /// Container to copy the environment from (virtual only)
    #[arg(long)]
    copy_from: Option<ContainerId>,
    /// Enable robotics simulation (virtual only)
    #[arg(long)]
    robotics: bool,
    /// Connect to the ecosystem with environments derived from the purpose
    #[arg(long)]
    connect: bool,
}

#[derive(Args)]
struct EditArgs {
    /// Container id
    id: ContainerId,
    #[arg(short, long)]
    tenant: Option<TenantId>,
    #[arg(long = "type", value_parser = parse_container_type)]
    container_type: Option<ContainerType>,
    #[arg(short, long, value_parser = parse_purpose)]
    purpose: Option<Purpose>,
    /// Seed type id to add; repeat for several
    #[arg(long = "add-seed")]
    add_seeds: Vec<SeedTypeId>,
    /// Seed type id to remove; repeat for several
    #[arg(long = "remove-seed")]
    remove_seeds: Vec<SeedTypeId>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    shadow_service: Option<bool>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// Connect (true) or disconnect (false) the ecosystem
    #[arg(long)]
    connect: Option<bool>,
    /// Show the change summary without saving
    #[arg(long)]
    dry_run: bool,
}

fn parse_container_type(value: &str) -> Result<ContainerType, String> {
    match value.trim().to_lowercase().as_str() {
        "physical" => Ok(ContainerType::Physical),
        "virtual" => Ok(ContainerType::Virtual),
        other => Err(format!("unknown container type '{other}'")),
    }
}

fn parse_purpose(value: &str) -> Result<Purpose, String> {
    match value.trim().to_lowercase().as_str() {
        "development" => Ok(Purpose::Development),
        "research" => Ok(Purpose::Research),
        "production" => Ok(Purpose::Production),
        other => Err(format!("unknown purpose '{other}'")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let (backend, config) = match &cli.fixture {
        Some(path) => {
            let fixture = Fixture::load(path)?;
            let config = fixture.form_config();
            (fixture.into_backend()?, config)
        }
        None => (InMemoryBackend::demo(), FormConfig::default()),
    };
    let backend: Arc<dyn ContainerBackend> = Arc::new(backend);
    info!(backend = backend.backend_name(), "backend ready");

    match cli.command {
        Commands::Create(args) => run_create(backend, config, args, cli.verbose).await?,
        Commands::Edit(args) => run_edit(backend, config, args, cli.verbose).await?,
        Commands::Environments { purpose } => show_environments(&purpose),
        Commands::Containers => list_containers(backend.as_ref()).await,
    }

    Ok(())
}

fn trace_events<M: FormMode>(controller: &mut FormController<M>, verbose: bool) {
    if verbose {
        controller.subscribe(|event: &FormEvent, view| {
            println!("  [event] {:?} (errors: {})", event, view.error_count);
        });
    }
}

async fn run_create(
    backend: Arc<dyn ContainerBackend>,
    config: FormConfig,
    args: CreateArgs,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = CreateFormController::new(backend, config);
    trace_events(&mut controller, verbose);
    controller.initialize_form().await;

    let tenant = args
        .tenant
        .or_else(|| controller.reference_data().tenants.first().map(|t| t.id));

    controller.update_form_field(FieldUpdate::Name(args.name.clone()));
    controller.update_form_field(FieldUpdate::TenantId(tenant));
    controller.toggle_container_type(args.container_type);
    controller.handle_purpose_change(args.purpose);
    for id in args.seeds {
        controller.add_seed_type(id);
    }
    if args.city.is_some() || args.country.is_some() || args.address.is_some() {
        controller.update_form_field(FieldUpdate::Location(Some(Location::new(
            args.city.unwrap_or_default(),
            args.country.unwrap_or_default(),
            args.address.unwrap_or_default(),
        ))));
    }
    if let Some(notes) = args.notes {
        controller.update_form_field(FieldUpdate::Notes(notes));
    }
    controller.update_form_field(FieldUpdate::ShadowServiceEnabled(args.shadow_service));
    if args.container_type == ContainerType::Virtual {
        controller.update_form_field(FieldUpdate::CopiedEnvironmentFrom(args.copy_from));
        controller.update_form_field(FieldUpdate::RoboticsSimulationEnabled(args.robotics));
    }
    controller.toggle_ecosystem_connection(args.connect);

    controller.check_container_name(&args.name);
    if let Some(validation) = controller.settle_name_check().await {
        debug!(is_valid = validation.is_valid, "name checked");
    }

    println!(
        "Seed types: {}",
        controller.model().get_selected_seed_types_display()
    );

    match controller.submit_form().await {
        Ok(outcome) => report_outcome(&outcome),
        Err(err) => report_form_error(&err),
    }
    Ok(())
}

async fn run_edit(
    backend: Arc<dyn ContainerBackend>,
    config: FormConfig,
    args: EditArgs,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = EditFormController::new(backend, config, args.id);
    trace_events(&mut controller, verbose);
    controller.initialize_form().await;

    if let Some(message) = controller.load_error() {
        println!("✗ {}", message);
        return Ok(());
    }
    if !controller.can_modify() {
        println!("Note: this container cannot be modified");
    }

    let dry_run = args.dry_run;
    apply_edits(&mut controller, args);

    let summary = controller.change_summary();
    if summary.is_empty() {
        println!("No changes.");
    } else {
        println!("Changes:");
        for entry in &summary {
            println!(
                "  {}: {} -> {}",
                entry.display_name, entry.old_value, entry.new_value
            );
        }
        println!("Risk: {:?}", controller.modification_risk());
        for action in controller.recommended_actions() {
            println!("  - {}", action);
        }
    }

    if dry_run {
        let result = controller.validate_form();
        if !result.is_valid {
            print_errors(&result.errors);
        }
        return Ok(());
    }

    match controller.submit_form().await {
        Ok(outcome) => report_outcome(&outcome),
        Err(err) => report_form_error(&err),
    }
    Ok(())
}

/// Applies the requested changes; unset location parts keep their current values.
fn apply_edits(controller: &mut EditFormController, args: EditArgs) {
    if let Some(tenant) = args.tenant {
        controller.update_form_field(FieldUpdate::TenantId(Some(tenant)));
    }
    if let Some(container_type) = args.container_type {
        controller.toggle_container_type(container_type);
    }
    if let Some(purpose) = args.purpose {
        controller.handle_purpose_change(purpose);
    }
    for id in args.add_seeds {
        controller.add_seed_type(id);
    }
    for id in args.remove_seeds {
        controller.remove_seed_type(id);
    }
    if let Some(notes) = args.notes {
        controller.update_form_field(FieldUpdate::Notes(notes));
    }
    if let Some(enabled) = args.shadow_service {
        controller.update_form_field(FieldUpdate::ShadowServiceEnabled(enabled));
    }
    if args.city.is_some() || args.country.is_some() || args.address.is_some() {
        let current = controller.form_data().location.clone().unwrap_or_default();
        controller.update_form_field(FieldUpdate::Location(Some(Location::new(
            args.city.unwrap_or(current.city),
            args.country.unwrap_or(current.country),
            args.address.unwrap_or(current.address),
        ))));
    }
    if let Some(connected) = args.connect {
        controller.toggle_ecosystem_connection(connected);
    }
}

fn report_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Created(container) => {
            println!("✓ Created container #{} '{}'", container.id, container.name)
        }
        SubmitOutcome::Updated(container) => {
            println!("✓ Saved container #{} '{}'", container.id, container.name)
        }
        SubmitOutcome::NoChanges => println!("Nothing to save."),
        SubmitOutcome::Rejected { errors } => {
            println!("✗ The backend rejected the form:");
            print_errors(errors);
        }
        SubmitOutcome::Failed { message } => println!("✗ {}", message),
    }
}

fn report_form_error(err: &FormError) {
    println!("✗ {}", err);
    if let FormError::Invalid { errors } = err {
        print_errors(errors);
    }
}

fn print_errors(errors: &[ValidationError]) {
    for error in errors {
        println!("  - {}", error);
    }
}

fn show_environments(purpose: &str) {
    let settings = model::rules::environment_settings_for_purpose_name(purpose);
    println!("Environments for '{}':", purpose.trim());
    println!("  fa:   {}", settings.fa.environment.as_str());
    println!("  pya:  {}", settings.pya.environment.as_str());
    println!("  aws:  {}", settings.aws.environment.as_str());
    println!("  mbai: {}", settings.mbai.environment.as_str());
}

async fn list_containers(backend: &dyn ContainerBackend) {
    match backend.list_available_containers(None).await {
        Ok(containers) if containers.is_empty() => println!("No containers."),
        Ok(containers) => {
            for container in containers {
                println!("  #{} {}", container.id, container.name);
            }
        }
        Err(err) => println!("✗ Failed to list containers: {}", err),
    }
}
