//! CLI assembly: merge flag overrides into the config, read input, wire
//! cancellation, and hand off to the dispatcher.

use std::io::Read;

use agentmux_core::api as core_api;
use tokio::sync::watch;

use crate::commands::cli::{ResumeArgs, RunArgs};

pub async fn run_app(args: RunArgs, mut cfg: core_api::AppConfig) -> Result<i32, core_api::CliError> {
    if args.quiet && args.verbose {
        return Err(core_api::CliError::Command(
            "--quiet and --verbose are mutually exclusive".to_string(),
        ));
    }

    apply_run_overrides(&mut cfg, &args);

    let input = read_input(args.input.as_deref())?;
    if input.trim().is_empty() {
        return Err(core_api::CliError::Command("input is empty".to_string()));
    }

    let default_backend = resolve_backend(args.backend.as_deref(), &cfg)?;

    let tasks = if args.single {
        let mut task = core_api::TaskSpec::new("task", default_backend, input);
        task.workdir = args.workdir.clone();
        vec![task]
    } else {
        core_api::parse_tasks(&input, default_backend)?
    };

    let cancel = spawn_cancel_watcher();
    let overlay = core_api::parse_overlay(&args.env);

    let dispatcher = core_api::Dispatcher::new(cfg, overlay, cancel);
    tracing::debug!(run_id = %dispatcher.run_id(), tasks = tasks.len(), "run initialized");
    let report = dispatcher.run_tasks(tasks).await?;

    render(&report, args.json)?;
    dispatcher.logs().cleanup();

    Ok(if report.all_passed() { 0 } else { 1 })
}

pub async fn resume_app(
    args: ResumeArgs,
    mut cfg: core_api::AppConfig,
) -> Result<i32, core_api::CliError> {
    if let Some(t) = args.timeout_secs {
        cfg.runner.timeout_secs = t;
    }
    if args.keep_logs {
        cfg.runner.keep_logs = true;
    }
    if let Some(dir) = &args.log_dir {
        cfg.runner.log_dir = Some(dir.clone());
    }

    let backend = resolve_backend(args.backend.as_deref(), &cfg)?;

    let instruction = if args.instruction.is_empty() {
        read_input(None)?
    } else {
        args.instruction.join(" ")
    };
    if instruction.trim().is_empty() {
        return Err(core_api::CliError::Command(
            "resume instruction is empty".to_string(),
        ));
    }

    let cancel = spawn_cancel_watcher();
    let overlay = core_api::parse_overlay(&args.env);

    let dispatcher = core_api::Dispatcher::new(cfg, overlay, cancel);
    let result = dispatcher
        .resume(&args.task_id, backend, &args.session_id, &instruction)
        .await?;

    let passed = result.status == core_api::TaskStatus::Passed;
    let mut report = core_api::RunReport::new(dispatcher.run_id());
    report.merge_resumed(result);

    render(&report, args.json)?;
    dispatcher.logs().cleanup();

    Ok(if passed { 0 } else { 1 })
}

fn apply_run_overrides(cfg: &mut core_api::AppConfig, args: &RunArgs) {
    if let Some(t) = args.timeout_secs {
        cfg.runner.timeout_secs = t;
    }
    if args.keep_logs {
        cfg.runner.keep_logs = true;
    }
    if let Some(dir) = &args.log_dir {
        cfg.runner.log_dir = Some(dir.clone());
    }
    if let Some(n) = args.max_parallel {
        cfg.dispatch.max_parallel = n;
    }
}

fn resolve_backend(
    flag: Option<&str>,
    cfg: &core_api::AppConfig,
) -> Result<core_api::Backend, core_api::CliError> {
    let name = flag.unwrap_or(cfg.dispatch.default_backend.as_str());
    core_api::Backend::parse(name)
        .ok_or_else(|| core_api::CliError::Config(format!("unknown backend: {name}")))
}

fn read_input(path: Option<&str>) -> Result<String, core_api::CliError> {
    match path {
        Some(p) => std::fs::read_to_string(p).map_err(core_api::CliError::Io),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(core_api::CliError::Io)?;
            Ok(buf)
        }
    }
}

fn render(report: &core_api::RunReport, json: bool) -> Result<(), core_api::CliError> {
    if json {
        let doc = report
            .to_json()
            .map_err(|e| core_api::CliError::Command(e.to_string()))?;
        println!("{doc}");
    } else {
        print!("{}", report.render_table());
    }
    Ok(())
}

/// SIGINT flips the cancel signal: running children get killed and their
/// tasks fail with a cancellation error; unstarted tasks are skipped.
fn spawn_cancel_watcher() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; cancelling run");
            let _ = tx.send(true);
            // Keep the sender alive so a second interrupt doesn't panic
            // the watch channel consumers.
            std::future::pending::<()>().await;
        }
    });
    rx
}
