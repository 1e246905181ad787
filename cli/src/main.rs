use clap::Parser;

mod app;
mod commands;

use agentmux_core::api as core_api;
use commands::cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.error_code().as_i32()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, core_api::CliError> {
    let mut args = cli::Args::parse();
    let cfg = core_api::load_default().map_err(|e| core_api::CliError::Config(e.to_string()))?;

    let (verbose, quiet) = match &args.command {
        Some(cli::Commands::Run(ra)) => (ra.verbose, ra.quiet),
        _ => (args.run.verbose, args.run.quiet),
    };
    let mut logging = cfg.logging.clone();
    if verbose {
        logging.level = "debug".to_string();
    } else if quiet {
        logging.level = "error".to_string();
    }
    init_tracing(&logging).map_err(core_api::CliError::Command)?;

    match args.command.take() {
        Some(cli::Commands::Run(run_args)) => app::run_app(run_args, cfg).await,
        Some(cli::Commands::Resume(resume_args)) => app::resume_app(resume_args, cfg).await,
        None => app::run_app(args.run, cfg).await,
    }
}

fn init_tracing(logging: &core_api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("agentmux"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("agentmux.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
