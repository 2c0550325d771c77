mod config_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    ntfy_relay_channels::ChannelRegistry,
    ntfy_relay_config::{RelayConfig, Severity},
    ntfy_relay_forward::{ForwardService, RelayContext},
    ntfy_relay_onebot::OneBotOutbound,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "ntfy-relay",
    version,
    about = "ntfy-relay: forward ntfy notifications to QQ"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/ntfy-relay/).
    #[arg(short, long, global = true, env = "NTFY_RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start relaying (default when no subcommand is provided).
    Run,
    /// Validate the configuration file and report errors/warnings.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => run(cli.config).await,
        Some(Commands::Check) => config_commands::check(cli.config.as_deref()),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<RelayConfig> {
    let config = match path {
        Some(path) => ntfy_relay_config::load_or_init(&path),
        None => ntfy_relay_config::discover_and_load(),
    };
    let config = config.context("failed to load configuration")?;

    let result = ntfy_relay_config::validate(&config);
    for d in &result.diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
        }
    }
    if result.has_errors() {
        anyhow::bail!(
            "configuration has {} error(s); run `ntfy-relay check` for details",
            result.count(Severity::Error)
        );
    }
    Ok(config)
}

async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "ntfy-relay starting");
    let config = load_config(config_path)?;

    let registry = Arc::new(ChannelRegistry::new());
    let onebot = OneBotOutbound::from_config(&config.onebot)?;
    registry.register(Arc::new(onebot));
    info!(api_url = %config.onebot.api_url, "registered OneBot adapter");

    let ctx = RelayContext::new(config, registry)?;
    let service = ForwardService::new(ctx);
    service.start().await?;

    wait_for_shutdown().await?;
    info!("shutting down");
    service.stop().await;
    Ok(())
}

async fn wait_for_shutdown() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .context("failed to install SIGTERM handler")?;
        tokio::select! {
            _ = sigterm.recv() => {},
            result = tokio::signal::ctrl_c() => result.context("failed to listen for ctrl-c")?,
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    Ok(())
}
