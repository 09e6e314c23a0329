use anyhow::{bail, Context, Result};
use carehub_agents::config::{AppConfig, CliConfig, FileConfig};
use carehub_agents::{
    builtin_agents, run_server, AgentRegistry, FullCareStore, RequestsLoggingLevel, ServerConfig,
    ServerStore, SqliteCareStore, SqliteServerStore,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory containing care.db and server.db. Created files are placed here.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Optional TOML config file. Its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Shared secret required to trigger agents over HTTP.
    #[clap(long, env = "AGENTS_SECRET")]
    pub agents_secret: Option<String>,

    /// Run a single agent, print its result as JSON and exit instead of serving.
    #[clap(long, value_name = "AGENT_ID")]
    pub run_agent: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            agents_secret: self.agents_secret.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening care database at {:?}", app_config.care_db_path());
    let care_store: Arc<dyn FullCareStore> = Arc::new(SqliteCareStore::new(
        app_config.care_db_path(),
    )?);

    info!("Opening server database at {:?}", app_config.server_db_path());
    let server_store: Arc<dyn ServerStore> = Arc::new(SqliteServerStore::new(
        app_config.server_db_path(),
    )?);
    let stale = server_store.mark_stale_runs_failed()?;
    if stale > 0 {
        info!("Marked {} interrupted agent run(s) as failed", stale);
    }

    let mut registry = AgentRegistry::with_server_store(Arc::clone(&server_store));
    for agent in builtin_agents(Arc::clone(&care_store)) {
        registry.register(agent);
    }
    let registry = Arc::new(registry);

    if let Some(agent_id) = &cli_args.run_agent {
        let result = registry.run(agent_id).await;
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.success {
            bail!("Agent '{}' did not succeed", agent_id);
        }
        return Ok(());
    }

    if app_config.agents.secret.is_none() {
        warn!("No agents secret configured, trigger endpoints are open");
    }

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        agents_secret: app_config.agents.secret.clone(),
        history_limit: app_config.agents.history_limit,
    };

    run_server(server_config, registry, care_store, server_store).await
}
