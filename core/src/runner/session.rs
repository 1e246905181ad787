use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

use crate::backend::Invocation;
use crate::error::RunnerError;

/// A running backend child. The trait seam exists so the run loop can be
/// exercised against arbitrary commands in tests.
#[async_trait]
pub trait RunnerSession: Send {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    async fn kill(&mut self) -> anyhow::Result<()>;
    async fn wait(&mut self) -> anyhow::Result<i32>;
}

#[derive(Debug)]
pub struct ProcessSession {
    child: Child,
}

impl ProcessSession {
    /// Spawn a composed invocation with piped output. Stdin is closed
    /// immediately: these CLIs are non-interactive here, and a dangling
    /// pipe makes some of them wait forever for input.
    pub fn spawn(invocation: &Invocation) -> Result<Self, RunnerError> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        if !invocation.env.is_empty() {
            cmd.env_clear();
            cmd.envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunnerError::BackendUnavailable(invocation.program.clone())
            } else {
                RunnerError::Spawn(e.to_string())
            }
        })?;

        Ok(Self { child })
    }
}

#[async_trait]
impl RunnerSession for ProcessSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn kill(&mut self) -> anyhow::Result<()> {
        self.child.kill().await?;
        Ok(())
    }

    async fn wait(&mut self) -> anyhow::Result<i32> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }
}
