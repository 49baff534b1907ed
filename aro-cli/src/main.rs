use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use log::info;

use aro_core::differ::Action;
use aro_core::poll::{PollPolicy, ReadErrorPolicy};
use aro_core::reconcile::{Outcome, ReconcileOptions};
use aro_core::resource::Ensure;
use aro_provider_azure::defaults::check_create;
use aro_provider_azure::schemas::openshift_cluster_schema;
use aro_provider_azure::{AroProvider, ClusterSpec, ProviderConfig, reconcile_cluster};

#[derive(Parser)]
#[command(name = "aro")]
#[command(about = "Manage Azure Red Hat OpenShift clusters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the cluster document without contacting Azure
    Validate {
        /// Path to a YAML or JSON cluster document
        file: PathBuf,
    },
    /// List the attributes a cluster document accepts
    Schema,
    /// Show what apply would do without changing anything
    Plan {
        /// Path to a YAML or JSON cluster document
        file: PathBuf,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
    /// Create or delete the cluster to match the document
    Apply {
        /// Path to a YAML or JSON cluster document
        file: PathBuf,

        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// Azure subscription ID (falls back to the document's subscription_id)
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    subscription_id: Option<String>,

    /// Bearer token for Azure Resource Manager
    #[arg(long, env = "AZURE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Override the resource provider endpoint
    #[arg(long, env = "ARO_ENDPOINT")]
    endpoint: Option<String>,

    /// Seconds between reads while waiting for a delete to finish
    #[arg(long, default_value_t = 20)]
    delete_poll_interval: u64,

    /// Reads to attempt while waiting for a delete (0 waits forever)
    #[arg(long, default_value_t = 90)]
    delete_poll_max_attempts: u32,

    /// Treat failed reads as a missing cluster instead of failing
    #[arg(long)]
    treat_read_errors_as_absent: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Schema => {
            print!("{}", openshift_cluster_schema().describe());
            Ok(())
        }
        Commands::Plan { file, connection } => run_plan(&file, &connection).await,
        Commands::Apply { file, connection } => run_apply(&file, &connection).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Read a YAML or JSON document; JSON parses as YAML
fn load_document(file: &Path) -> Result<serde_json::Value, String> {
    let content = fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;

    serde_yaml::from_str(&content).map_err(|e| format!("Parse error: {}", e))
}

fn load_spec(file: &Path) -> Result<ClusterSpec, String> {
    let document = load_document(file)?;
    ClusterSpec::from_document(document).map_err(|e| e.to_string())
}

fn run_validate(file: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let spec = load_spec(file)?;
    let resource = spec.to_resource();
    if resource.ensure == Ensure::Present {
        check_create(&resource.body).map_err(|e| e.to_string())?;
    }

    println!(
        "{}",
        "✓ Cluster document validated successfully.".green().bold()
    );
    println!("  • {} ({})", resource.id, resource.ensure);
    Ok(())
}

async fn run_plan(file: &Path, connection: &ConnectionArgs) -> Result<(), String> {
    let spec = load_spec(file)?;
    let outcome = run_reconcile(&spec, connection, true).await?;

    print_action(&outcome, &spec);
    print_result(&outcome)
}

async fn run_apply(file: &Path, connection: &ConnectionArgs) -> Result<(), String> {
    let spec = load_spec(file)?;
    let outcome = run_reconcile(&spec, connection, false).await?;

    print_result(&outcome)
}

async fn run_reconcile(
    spec: &ClusterSpec,
    connection: &ConnectionArgs,
    check_mode: bool,
) -> Result<Outcome, String> {
    let config = provider_config(spec, connection)?;
    let provider = AroProvider::new(config).map_err(|e| e.to_string())?;
    let options = reconcile_options(connection, check_mode);
    info!(
        "Reconciling {} to {} (check mode: {})",
        spec.resource_id(),
        spec.state,
        check_mode
    );

    reconcile_cluster(spec, &provider, &options)
        .await
        .map_err(|e| e.to_string())
}

fn provider_config(
    spec: &ClusterSpec,
    connection: &ConnectionArgs,
) -> Result<ProviderConfig, String> {
    let subscription_id = connection
        .subscription_id
        .clone()
        .or_else(|| spec.subscription_id.clone())
        .filter(|s| !s.is_empty())
        .ok_or("No subscription ID: pass --subscription-id or set AZURE_SUBSCRIPTION_ID")?;
    let access_token = connection
        .access_token
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or("No access token: pass --access-token or set AZURE_ACCESS_TOKEN")?;

    let mut config = ProviderConfig::new(subscription_id, access_token)
        .with_rp_mode(spec.rp_mode)
        .with_api_version(spec.api_version.clone());
    if let Some(endpoint) = &connection.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    Ok(config)
}

fn reconcile_options(connection: &ConnectionArgs, check_mode: bool) -> ReconcileOptions {
    let read_errors = if connection.treat_read_errors_as_absent {
        ReadErrorPolicy::TreatAsAbsent
    } else {
        ReadErrorPolicy::Propagate
    };

    ReconcileOptions {
        check_mode,
        read_errors,
        delete_poll: PollPolicy::with_max_attempts(connection.delete_poll_max_attempts)
            .with_interval(Duration::from_secs(connection.delete_poll_interval)),
    }
}

fn print_action(outcome: &Outcome, spec: &ClusterSpec) {
    let id = spec.resource_id();
    match outcome.action {
        Action::NoAction => {
            println!("{}", "No changes. Cluster is up-to-date.".green());
        }
        Action::Create => println!("{} Create {}", "+".green().bold(), id),
        Action::Delete => println!("{} Delete {}", "-".red().bold(), id),
        Action::Update => println!(
            "{} {} {}",
            "~".yellow().bold(),
            id,
            "exists; updates are not applied".yellow()
        ),
    }
}

fn print_result(outcome: &Outcome) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&outcome.result)
        .map_err(|e| format!("Failed to serialize result: {}", e))?;
    println!("{}", json);
    Ok(())
}
