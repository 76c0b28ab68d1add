mod cli;
mod receiver;

use clap::Parser;
use eyre::WrapErr;
use std::path::Path;

use crate::cli::{Cli, Commands, FILE_GUARD};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let (cfg, defaulted) = load_config(&cli.config)?;
    init_logging(cli.json, &cli.log_level, &cfg.logging);
    if defaulted {
        tracing::warn!(path = %cli.config.display(), "config file not found; using defaults");
    }

    match cli.cmd {
        Commands::Run {
            iterations,
            direct,
            demo,
            intensity,
            duration_s,
            status_json,
        } => receiver::run(
            &cfg,
            receiver::RunOpts {
                iterations,
                direct,
                demo,
                intensity,
                duration_s,
                status_json,
            },
        ),
        Commands::Recipes => receiver::list_recipes(&cfg),
        Commands::SelfCheck => receiver::self_check(),
    }
}

fn load_config(path: &Path) -> eyre::Result<(aromix_config::Config, bool)> {
    if !path.exists() {
        return Ok((aromix_config::Config::default(), true));
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = aromix_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("validate config {}", path.display()))?;
    Ok((cfg, false))
}

fn init_logging(json: bool, level: &str, logging: &aromix_config::Logging) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(logging.level.as_deref().unwrap_or(level))
    });

    match &logging.file {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("aromix.log"));
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        None => {
            let builder = tracing_subscriber::fmt().with_env_filter(filter);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
    }
}
