//! agentmux-core: a parallel task dispatcher for code-agent CLI backends.
//!
//! Tasks are parsed from a delimited descriptor format, validated into a
//! dependency DAG, and executed in concurrent waves against external
//! coding-agent CLIs (codex, claude, gemini). Each subprocess is
//! supervised with a per-task timeout, its output teed to a transcript
//! log, and its stream interpreted into a structured result: status,
//! self-reported coverage, touched files, and a session id usable for
//! later resume calls.

pub mod api;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod env_overlay;
pub mod error;
pub mod graph;
pub mod interpret;
pub mod logs;
pub mod report;
pub mod runner;
pub mod task;
pub mod util;
