use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "agentmux",
    about = "Dispatch prompts across code-agent CLI backends (codex, claude, gemini)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// With no subcommand, behaves as `run`.
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Read task descriptors from a file instead of stdin.
    #[arg(long, short = 'i')]
    pub input: Option<String>,

    /// Treat the entire input as one task's prompt: no delimiters, no
    /// dependency graph.
    #[arg(long)]
    pub single: bool,

    /// Backend for --single mode, and the default for task blocks that
    /// omit one.
    #[arg(long)]
    pub backend: Option<String>,

    /// Working directory for --single mode.
    #[arg(long, default_value = ".")]
    pub workdir: String,

    /// Emit the full machine-readable report instead of the table.
    #[arg(long)]
    pub json: bool,

    /// Default per-task timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Retain per-task transcript logs after the run.
    #[arg(long)]
    pub keep_logs: bool,

    /// Maximum tasks launched concurrently within a wave (0 = unbounded).
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// Root directory for transcript logs.
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Extra environment variables for backend processes (KEY=VALUE).
    /// Can be specified multiple times.
    #[arg(long = "env", action = clap::ArgAction::Append)]
    pub env: Vec<String>,

    #[arg(long)]
    pub quiet: bool,

    #[arg(long)]
    pub verbose: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ResumeArgs {
    /// Session identifier reported by a prior run.
    #[arg(long)]
    pub session_id: String,

    /// Backend that owns the session.
    #[arg(long)]
    pub backend: Option<String>,

    /// Task id to report the merged result under.
    #[arg(long, default_value = "resume")]
    pub task_id: String,

    #[arg(long)]
    pub json: bool,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long)]
    pub keep_logs: bool,

    #[arg(long)]
    pub log_dir: Option<String>,

    /// Extra environment variables for the backend process (KEY=VALUE).
    #[arg(long = "env", action = clap::ArgAction::Append)]
    pub env: Vec<String>,

    /// Follow-up instruction text; read from stdin when omitted.
    #[arg(trailing_var_arg = true)]
    pub instruction: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse task descriptors and dispatch them in dependency waves.
    Run(RunArgs),
    /// Re-invoke a backend against a prior session with a follow-up
    /// instruction.
    Resume(ResumeArgs),
}
