use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modkit::runtime::{run, DbOptions, RunOptions, ShutdownOptions};
use modkit::RegistryBuilder;
use modkit_db::{redact_credentials_in_dsn, DbHandle};
use runtime::{AppConfig, CliArgs};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use api_ingress::ApiIngress;
use users_info::UsersInfo;

/// Hands the `modules` section of the app config to modkit.
struct ModulesConfig(HashMap<String, serde_json::Value>);

impl modkit::ConfigProvider for ModulesConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

/// Userstore Server - user records over HTTP
#[derive(Parser)]
#[command(name = "userstore-server")]
#[command(about = "Userstore Server - user records over HTTP")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    apply_ingress_bind_addr(&mut config, args.port.is_some());

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Userstore Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

/// Keep `modules.api_ingress.bind_addr` in step with `server.host`/`server.port`.
///
/// An explicit `bind_addr` in the module section wins unless `--port` was given.
fn apply_ingress_bind_addr(config: &mut AppConfig, port_overridden: bool) {
    let derived = format!("{}:{}", config.server.host, config.server.port);
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));
    let Some(obj) = section.as_object_mut() else {
        return;
    };
    if port_overridden || !obj.contains_key("bind_addr") {
        obj.insert("bind_addr".to_string(), serde_json::Value::String(derived));
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let db_config = config
        .database
        .clone()
        .context("Database configuration is required (set database.url or DATABASE_URL)")?;
    let dsn = db_config.resolved_dsn(Path::new(&config.server.home_dir));
    tracing::info!(
        dsn = %redact_credentials_in_dsn(Some(&dsn)),
        "Connecting to database"
    );
    let db = Arc::new(
        DbHandle::connect(&dsn, db_config.connect_opts())
            .await
            .context("Failed to connect to database")?,
    );
    tracing::info!(engine = ?db.engine(), "Database connected");

    let users = Arc::new(UsersInfo::default());
    let ingress = Arc::new(ApiIngress::default());
    let mut builder = RegistryBuilder::default();
    builder
        .register_core(users_info::MODULE_NAME, users.clone())
        .register_db(users_info::MODULE_NAME, users.clone())
        .register_rest(users_info::MODULE_NAME, users)
        .register_core(api_ingress::MODULE_NAME, ingress.clone())
        .register_rest_host(api_ingress::MODULE_NAME, ingress.clone())
        .register_stateful(api_ingress::MODULE_NAME, ingress);
    let registry = builder.build()?;

    let result = run(RunOptions {
        modules_cfg: Arc::new(ModulesConfig(config.modules.clone())),
        db: DbOptions::Handle(db.clone()),
        registry,
        shutdown: ShutdownOptions::Signals,
    })
    .await;

    db.close().await;
    tracing::info!("Userstore Server stopped");
    result
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // The module sections must parse into their typed configs.
    if let Some(section) = config.modules.get(api_ingress::MODULE_NAME) {
        let ingress: api_ingress::ApiIngressConfig = serde_json::from_value(section.clone())
            .context("Invalid modules.api_ingress section")?;
        ingress
            .bind_addr
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("Invalid bind address: {}", ingress.bind_addr))?;
    }
    if let Some(section) = config.modules.get(users_info::MODULE_NAME) {
        serde_json::from_value::<users_info::config::UsersInfoConfig>(section.clone())
            .context("Invalid modules.users_info section")?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);
    Ok(())
}
