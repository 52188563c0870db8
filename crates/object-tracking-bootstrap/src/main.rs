//! Object Tracking Bootstrap - MongoDB provisioning CLI
//!
//! This is the entry point for the `object-tracking-bootstrap` binary.
//!
//! # Commands
//!
//! - `run` (default) - Create the admin user, database, collections, and indexes
//! - `verify` - Compare the server against the plan without modifying it
//! - `plan` - Print the steps a run would execute, without connecting
//!
//! # Configuration
//!
//! Flags override their environment variables, which override the optional
//! JSON file given with `--config`. The connection string defaults to
//! `mongodb://localhost:27017/`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use object_tracking_bootstrap::{
    procedure, verify, BootstrapConfig, BootstrapError, BootstrapReport, Plan, VerifyReport,
};
use object_tracking_core::Password;
use object_tracking_store::MongoProvisioner;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Provision the object-tracking MongoDB database.
#[derive(Parser)]
#[command(name = "object-tracking-bootstrap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file.
    #[arg(long, env = "BOOTSTRAP_CONFIG")]
    config: Option<PathBuf>,

    /// MongoDB connection string.
    #[arg(long, env = "MONGODB_URI")]
    mongodb_uri: Option<String>,

    /// Application database to provision.
    #[arg(long, env = "OBJECT_TRACKING_DATABASE")]
    database: Option<String>,

    /// Password for the administrative user.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Seconds to wait for a usable server.
    #[arg(long, env = "SERVER_SELECTION_TIMEOUT_SECONDS")]
    server_selection_timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Create the admin user, database, collections, and indexes.
    Run,
    /// Check the server state against the plan without modifying it.
    Verify {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the steps a run would execute, without connecting.
    Plan {
        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so `plan --json` and `verify --json` stay parseable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,object_tracking=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e
                .downcast_ref::<BootstrapError>()
                .map_or(1, BootstrapError::exit_code);
            eprintln!("error: {e:#}");
            ExitCode::from(code)
        }
    }
}

async fn execute(args: Args) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    config.validate()?;
    let plan = Plan::from_config(&config)?;

    match args.command.unwrap_or(Command::Run) {
        Command::Plan { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{plan}");
            }
        }
        Command::Run => {
            let provisioner = connect(&config).await?;
            let report = procedure::run(&provisioner, &plan)
                .await
                .context("bootstrap aborted")?;
            print_run_report(&report);
        }
        Command::Verify { json } => {
            let provisioner = connect(&config).await?;
            let report = verify(&provisioner, &plan).await?;
            print_verify_report(&report, json)?;
            if !report.is_clean() {
                return Err(BootstrapError::Verification {
                    count: report.discrepancies.len(),
                }
                .into());
            }
        }
    }

    Ok(())
}

/// Layer command-line and environment values over the file or defaults.
fn resolve_config(args: &Args) -> Result<BootstrapConfig, BootstrapError> {
    let mut config = BootstrapConfig::load(args.config.as_deref())?;

    if let Some(uri) = &args.mongodb_uri {
        config.mongodb_uri.clone_from(uri);
    }
    if let Some(database) = &args.database {
        config.database.clone_from(database);
    }
    if let Some(password) = &args.admin_password {
        config.admin_password = Password::new(password.as_str());
    }
    if let Some(seconds) = args.server_selection_timeout {
        config.server_selection_timeout_seconds = seconds;
    }

    tracing::debug!(
        database = %config.database,
        app_name = %config.app_name,
        server_selection_timeout_seconds = config.server_selection_timeout_seconds,
        "Configuration loaded"
    );

    Ok(config)
}

async fn connect(config: &BootstrapConfig) -> Result<MongoProvisioner, BootstrapError> {
    tracing::info!(app_name = %config.app_name, "Connecting to MongoDB");

    let provisioner = MongoProvisioner::connect(
        &config.mongodb_uri,
        &config.app_name,
        config.server_selection_timeout(),
    )
    .await?;
    provisioner.ping().await?;

    tracing::info!("Connected to MongoDB");
    Ok(provisioner)
}

fn print_run_report(report: &BootstrapReport) {
    let elapsed = report.finished_at - report.started_at;
    println!(
        "Provisioned {}: {} steps, {} collections, {} indexes in {} ms",
        report.database,
        report.steps_completed,
        report.collections.len(),
        report.indexes.len(),
        elapsed.num_milliseconds()
    );
    for index in &report.indexes {
        println!("  index {index}");
    }
}

fn print_verify_report(report: &VerifyReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else if report.is_clean() {
        println!("OK: {} checks passed", report.checks);
    } else {
        for discrepancy in &report.discrepancies {
            println!("MISMATCH: {discrepancy}");
        }
    }
    Ok(())
}
