//! Backend command dialects.
//!
//! Each supported coding-agent CLI speaks its own argument dialect. The
//! shapes live in one static table so that adding a backend is a data
//! change plus one output-parsing rule, not new control flow. The argument
//! shapes are wire contracts with the external CLIs; getting them wrong
//! makes the subprocess invocation fail outright.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Codex,
    Claude,
    Gemini,
}

impl Backend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "codex" => Some(Self::Codex),
            "claude" => Some(Self::Claude),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.dialect().program
    }

    pub fn dialect(&self) -> &'static Dialect {
        &DIALECTS[*self as usize]
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a dialect addresses a prior session when resuming.
#[derive(Debug, Clone, Copy)]
pub enum ResumeStyle {
    /// A verb inserted before the session id: `codex exec resume <id>`.
    Verb(&'static str),
    /// A flag preceding the session id: `claude -r <id>`.
    Flag(&'static str),
}

/// One backend's fixed command-line shape.
#[derive(Debug)]
pub struct Dialect {
    pub backend: Backend,
    pub program: &'static str,
    /// Verb for one-shot execution, if the CLI uses one.
    pub oneshot_verb: Option<&'static str>,
    /// Flags always present for non-interactive use.
    pub base_flags: &'static [&'static str],
    /// Flags selecting structured/streaming output.
    pub output_flags: &'static [&'static str],
    /// Working-directory flag. `None` means the child is spawned with its
    /// current directory set to the task workdir instead.
    pub workdir_flag: Option<&'static str>,
    /// Permission-bypass flag, appended only on explicit opt-in.
    pub skip_permissions_flag: Option<&'static str>,
    pub resume: ResumeStyle,
    /// Gemini wants the prompt before its flags; the others take it last.
    pub prompt_first: bool,
}

static DIALECTS: [Dialect; 3] = [
    Dialect {
        backend: Backend::Codex,
        program: "codex",
        oneshot_verb: Some("exec"),
        base_flags: &["--skip-git-repo-check"],
        output_flags: &["--json"],
        workdir_flag: Some("--cd"),
        skip_permissions_flag: None,
        resume: ResumeStyle::Verb("resume"),
        prompt_first: false,
    },
    Dialect {
        backend: Backend::Claude,
        program: "claude",
        oneshot_verb: None,
        base_flags: &["-p"],
        output_flags: &["--output-format", "stream-json", "--verbose"],
        workdir_flag: None,
        skip_permissions_flag: Some("--dangerously-skip-permissions"),
        resume: ResumeStyle::Flag("-r"),
        prompt_first: false,
    },
    Dialect {
        backend: Backend::Gemini,
        program: "gemini",
        oneshot_verb: None,
        base_flags: &["-y"],
        output_flags: &["-o", "stream-json"],
        workdir_flag: None,
        skip_permissions_flag: None,
        resume: ResumeStyle::Flag("-r"),
        prompt_first: true,
    },
];

/// A fully composed subprocess invocation, ready to spawn.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Spawn cwd for dialects without a workdir flag.
    pub cwd: Option<PathBuf>,
    /// Full child environment, already merged and sorted.
    pub env: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct ComposeOpts {
    pub claude_skip_permissions: bool,
    /// When set, compose the resume dialect against this session instead
    /// of a fresh one-shot prompt.
    pub resume_session: Option<String>,
}

impl Dialect {
    /// Compose the argument vector for one task. The prompt is always the
    /// positional argument; everything else comes from the table.
    pub fn compose(&self, prompt: &str, workdir: &str, opts: &ComposeOpts) -> Invocation {
        let mut args: Vec<String> = Vec::new();

        if self.prompt_first && !prompt.is_empty() {
            args.push(prompt.to_string());
        }

        if let Some(verb) = self.oneshot_verb {
            args.push(verb.to_string());
        }
        args.extend(self.base_flags.iter().map(|s| s.to_string()));
        if self.backend == Backend::Claude && opts.claude_skip_permissions {
            if let Some(flag) = self.skip_permissions_flag {
                args.push(flag.to_string());
            }
        }
        args.extend(self.output_flags.iter().map(|s| s.to_string()));

        let cwd = match self.workdir_flag {
            Some(flag) => {
                args.push(flag.to_string());
                args.push(workdir.to_string());
                None
            }
            None => Some(PathBuf::from(workdir)),
        };

        if let Some(session) = opts.resume_session.as_deref() {
            if !session.trim().is_empty() {
                match self.resume {
                    ResumeStyle::Verb(verb) => {
                        args.push(verb.to_string());
                        args.push(session.to_string());
                    }
                    ResumeStyle::Flag(flag) => {
                        args.push(flag.to_string());
                        args.push(session.to_string());
                    }
                }
            }
        }

        if !self.prompt_first && !prompt.is_empty() {
            args.push(prompt.to_string());
        }

        Invocation {
            program: self.program.to_string(),
            args,
            cwd,
            env: Vec::new(),
        }
    }
}

/// Resolve a backend executable to a concrete path.
///
/// Absolute paths pass through untouched; otherwise each `PATH` entry is
/// searched for an executable file.
pub fn resolve_executable(program: &str) -> Result<String, RunnerError> {
    let candidate = Path::new(program);
    if candidate.is_absolute() {
        if candidate.is_file() {
            return Ok(program.to_string());
        }
        return Err(RunnerError::BackendUnavailable(program.to_string()));
    }

    if let Some(path_env) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_env) {
            let full = dir.join(program);
            if full.is_file() && is_executable(&full) {
                return Ok(full.to_string_lossy().to_string());
            }
        }
    }

    Err(RunnerError::BackendUnavailable(program.to_string()))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
