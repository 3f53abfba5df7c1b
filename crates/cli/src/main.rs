use std::{io::Write, path::PathBuf};

use {
    clap::{Parser, Subcommand},
    scribe_config::ScribeConfig,
    scribe_plugins::{CandidateStatus, ModuleCatalog, PluginLoader},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "scribe", about = "Scribe, a collaborative pad server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file to load instead of searching for one.
    #[arg(long, global = true, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory searched for scribe.{toml,yaml,yml,json} after the
    /// working directory.
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server.
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        plugins_dir: Option<PathBuf>,
    },
    /// List plugin directory entries and whether they load.
    Plugins,
    /// Print the effective configuration as TOML.
    Config,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn apply_serve_overrides(
    config: &mut ScribeConfig,
    bind: Option<String>,
    port: Option<u16>,
    plugins_dir: Option<PathBuf>,
) {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = plugins_dir {
        config.plugins.dir = dir;
    }
}

async fn list_plugins(config: &ScribeConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let loader = PluginLoader::new(config.plugins.dir.clone(), ModuleCatalog::new());
    let candidates = match loader.discover().await {
        Ok(candidates) => candidates,
        Err(e) => {
            writeln!(out, "cannot read {}: {e}", loader.dir().display())?;
            return Ok(());
        },
    };
    if candidates.is_empty() {
        writeln!(out, "no plugins in {}", loader.dir().display())?;
    }
    for candidate in candidates {
        let status = match candidate.status {
            CandidateStatus::Loaded => "ok".to_string(),
            CandidateStatus::NoManifest => "skipped (no plugin.toml)".to_string(),
            CandidateStatus::Failed(e) => format!("error: {e}"),
        };
        writeln!(out, "{:<24} {status}", candidate.name)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    if let Some(dir) = &cli.config_dir {
        scribe_config::set_config_dir(dir.clone());
    }
    let mut config = scribe_config::discover_and_load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            bind,
            port,
            plugins_dir,
        } => {
            apply_serve_overrides(&mut config, bind, port, plugins_dir);
            info!(version = env!("CARGO_PKG_VERSION"), "scribe starting");
            scribe_gateway::start_gateway(config, ModuleCatalog::new()).await?;
            Ok(())
        },
        Commands::Plugins => list_plugins(&config, &mut std::io::stdout()).await,
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
    }
}
