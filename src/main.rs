use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use sensorflow::app::App;
use sensorflow::config::Config;
use sensorflow::env_vars::{env_vars_by_category, ENV_VARS};
use sensorflow::icons::{icon, IconKey};
use sensorflow::listing::{
    DeviceSort, ListQuery, Listable, ModuleSort, SortKey, SortSpec, StatusFilter,
};
use sensorflow::logging;
use sensorflow::rest;
use sensorflow::store::{Backend, MockBackend};
use sensorflow::types::{Device, Module, StatusTag, User};

#[derive(Parser)]
#[command(name = "sensorflow")]
#[command(about = "Smart Sensor Flow console: devices, subscriptions, modules and access")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List subscription plans
    Plans,

    /// List organizations
    Orgs,

    /// List devices
    Devices {
        /// Only show devices with this status (online, offline, maintenance, error)
        #[arg(short, long)]
        status: Option<String>,

        /// Free-text filter on name, serial number and location
        #[arg(short, long)]
        query: Option<String>,

        /// Sort column (name, status, kind, battery, last_seen)
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// List marketplace modules
    Modules {
        /// Only show modules with this status (draft, pending_review, published, rejected)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// List user accounts
    Users {
        /// Only show accounts with this status (active, invited, locked, disabled)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Start the REST API server
    Api {
        /// Port to listen on (default: rest_api.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the OpenAPI document as JSON
    Openapi,

    /// List supported environment variables
    Env,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging setup reads the config
    let config = Config::load(cli.config.as_deref())?;

    let is_tui_mode = cli.command.is_none();

    // File logging in TUI mode, stderr otherwise
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    let backend: Arc<dyn Backend> = Arc::new(
        MockBackend::from_config(&config).context("failed to initialize the mock backend")?,
    );

    match cli.command {
        Some(Commands::Plans) => cmd_plans(backend.as_ref()).await?,
        Some(Commands::Orgs) => cmd_orgs(backend.as_ref()).await?,
        Some(Commands::Devices {
            status,
            query,
            sort,
            desc,
        }) => cmd_devices(backend.as_ref(), status, query, sort, desc).await?,
        Some(Commands::Modules { status }) => cmd_modules(backend.as_ref(), status).await?,
        Some(Commands::Users { status }) => cmd_users(backend.as_ref(), status).await?,
        Some(Commands::Api { port }) => cmd_api(&config, backend, port).await?,
        Some(Commands::Openapi) => cmd_openapi()?,
        Some(Commands::Env) => cmd_env(),
        None => run_tui(config, backend, logging_handle.log_file_path).await?,
    }

    Ok(())
}

async fn run_tui(
    config: Config,
    backend: Arc<dyn Backend>,
    log_file_path: Option<PathBuf>,
) -> Result<()> {
    let mut app = App::new(config, backend);
    let result = app.run().await;

    // Point at the session log if anything was written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

fn parse_status<R: Listable>(status: Option<String>) -> Result<StatusFilter<R::Status>> {
    match status {
        Some(value) => StatusFilter::parse(&value).map_err(|e| anyhow!(e)),
        None => Ok(StatusFilter::All),
    }
}

async fn cmd_plans(backend: &dyn Backend) -> Result<()> {
    let plans = backend.list_plans().await?;

    println!("Plans ({})", plans.len());
    println!("{}", "─".repeat(60));
    for plan in &plans {
        let popular = if plan.is_popular { " ★" } else { "" };
        println!(
            "{:<12} {:<13} ${:>8.2}/mo{}",
            plan.name,
            plan.plan_type.label(),
            plan.price,
            popular
        );
        println!("    {}", plan.description);
    }
    Ok(())
}

async fn cmd_orgs(backend: &dyn Backend) -> Result<()> {
    let organizations = backend.list_organizations().await?;

    println!("Organizations ({})", organizations.len());
    println!("{}", "─".repeat(60));
    for org in &organizations {
        println!(
            "{:<28} {:<10} {:<12} {}",
            org.name,
            org.status.label(),
            org.plan_id,
            org.address.city
        );
    }
    Ok(())
}

async fn cmd_devices(
    backend: &dyn Backend,
    status: Option<String>,
    query: Option<String>,
    sort: Option<String>,
    desc: bool,
) -> Result<()> {
    let key = match sort {
        Some(value) => DeviceSort::parse_key(&value).map_err(|e| anyhow!(e))?,
        None => DeviceSort::Name,
    };
    let spec = if desc {
        SortSpec::descending(key)
    } else {
        SortSpec::ascending(key)
    };
    let list_query = ListQuery::<Device>::new()
        .status(parse_status::<Device>(status)?)
        .text(query.unwrap_or_default())
        .sort(spec);

    let all = backend.list_devices().await?;
    let devices = list_query.apply(&all);

    println!(
        "Devices ({} of {}, sorted by {} {})",
        devices.len(),
        all.len(),
        spec.key.label(),
        spec.order.arrow()
    );
    println!("{}", "─".repeat(72));

    let now = Utc::now();
    for device in &devices {
        let glyph = icon(IconKey::Device(device.kind)).glyph;
        let battery = device
            .battery_level
            .map_or_else(|| "mains".to_string(), |b| format!("{}%", b));
        let minutes = (now - device.last_seen).num_minutes().max(0);
        println!(
            "{} {:<22} {:<12} {:>6}  {:>5}m ago  {}",
            glyph,
            device.name,
            device.status.label(),
            battery,
            minutes,
            device.location
        );
    }
    Ok(())
}

async fn cmd_modules(backend: &dyn Backend, status: Option<String>) -> Result<()> {
    let list_query = ListQuery::<Module>::new()
        .status(parse_status::<Module>(status)?)
        .sort(SortSpec::descending(ModuleSort::Downloads));

    let modules = list_query.apply(&backend.list_modules().await?);

    println!("Modules ({})", modules.len());
    println!("{}", "─".repeat(72));
    for module in &modules {
        let glyph = icon(IconKey::Module(module.category)).glyph;
        println!(
            "{} {:<26} {:<8} {:<15} {:>7} dl  {:.1}★  {}",
            glyph,
            module.name,
            module.version,
            module.status.label(),
            module.downloads,
            module.rating,
            module.pricing.display()
        );
    }
    Ok(())
}

async fn cmd_users(backend: &dyn Backend, status: Option<String>) -> Result<()> {
    let list_query = ListQuery::<User>::new().status(parse_status::<User>(status)?);

    let users = list_query.apply(&backend.list_users().await?);
    let roles = backend.list_roles().await?;

    println!("Users ({})", users.len());
    println!("{}", "─".repeat(72));
    for user in &users {
        let role = roles
            .iter()
            .find(|r| r.id == user.role_id)
            .map_or(user.role_id.as_str(), |r| r.name.as_str());
        let last_login = user
            .last_login
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d").to_string());
        println!(
            "{:<20} {:<32} {:<10} {:<14} {}",
            user.name,
            user.email,
            user.status.label(),
            role,
            last_login
        );
    }
    Ok(())
}

async fn cmd_api(config: &Config, backend: Arc<dyn Backend>, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.rest_api.port);

    println!("Starting REST API server...");
    println!("  Port: {}", port);
    println!("  Endpoints:");
    println!("    GET  /api/v1/health                      Health check");
    println!("    GET  /api/v1/plans                       List plans");
    println!("    GET  /api/v1/organizations               List organizations");
    println!("    POST /api/v1/organizations               Create organization");
    println!("    GET  /api/v1/devices                     List devices");
    println!("    GET  /api/v1/modules                     List modules");
    println!("    POST /api/v1/modules                     Submit module");
    println!("    GET  /api/v1/subscriptions               List subscriptions");
    println!("    GET  /api/v1/users                       List users");
    println!("    POST /api/v1/auth/password-reset         Request reset code");
    println!();

    let state = rest::ApiState::new(config.clone(), backend);
    rest::serve(state, port).await?;

    Ok(())
}

fn cmd_openapi() -> Result<()> {
    let json = rest::ApiDoc::json().context("failed to serialize the OpenAPI document")?;
    println!("{}", json);
    Ok(())
}

fn cmd_env() {
    println!("Environment variables ({})", ENV_VARS.len());
    for (category, vars) in env_vars_by_category() {
        println!();
        println!("{}", category.display_name());
        println!("{}", "─".repeat(60));
        for var in vars {
            println!("  {}", var.name);
            println!("      {}", var.description);
            if let Some(default) = var.default {
                println!("      default: {}", default);
            }
        }
    }
}
