//! The per-task run loop: spawn -> pump -> wait, with timeout and
//! cancellation, teeing output into the transcript log while projecting
//! lines into the fields the interpreter needs.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, watch};

use crate::error::RunnerError;
use crate::interpret::{assistant_text_in_line, extract_session_id, touched_files_in_line};
use crate::util::RingBytes;

use super::io_pump::{self, LineStream, LineTap};
use super::session::RunnerSession;

/// How a child left the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited,
    TimedOut,
    Cancelled,
}

/// How long to keep reading pipe leftovers once the child was killed.
const KILL_DRAIN_GRACE: Duration = Duration::from_secs(2);

pub struct RunRequest {
    pub timeout: Duration,
    pub capture_bytes: usize,
    pub log_path: PathBuf,
    pub cancel: watch::Receiver<bool>,
}

#[derive(Debug)]
pub struct RunOutput {
    pub exit_code: i32,
    pub termination: Termination,
    pub duration: Duration,
    /// Session id the backend reported in its stream, if any.
    pub session_id: Option<String>,
    /// Assistant-visible text: stream-json assistant blocks for structured
    /// backends, raw stdout for plain-text ones. Bounded.
    pub text: String,
    /// Files the stream reported touching, sorted and deduplicated.
    pub files: Vec<String>,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

/// One dedicated sink per task: log writer plus the line projections.
/// Nothing here is shared across tasks, so concurrent waves never contend.
struct LineSink {
    writer: BufWriter<fs::File>,
    text: String,
    text_cap: usize,
    session_id: Option<String>,
    files: BTreeSet<String>,
}

impl LineSink {
    async fn accept(&mut self, tap: &LineTap) {
        let _ = self.writer.write_all(tap.line.as_bytes()).await;
        let _ = self.writer.write_all(b"\n").await;

        if tap.line.trim_start().starts_with('{') {
            if self.session_id.is_none() {
                self.session_id = extract_session_id(&tap.line);
            }
            if let Some(text) = assistant_text_in_line(&tap.line) {
                self.push_text(&text);
            }
            for path in touched_files_in_line(&tap.line) {
                self.files.insert(path);
            }
        } else if tap.stream == LineStream::Stdout {
            self.push_text(&tap.line);
        }
    }

    fn push_text(&mut self, chunk: &str) {
        if self.text.len() >= self.text_cap {
            return;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        let remaining = self.text_cap - self.text.len();
        if chunk.len() <= remaining {
            self.text.push_str(chunk);
        } else {
            let end = chunk
                .char_indices()
                .take_while(|(i, _)| *i < remaining)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            self.text.push_str(&chunk[..end]);
        }
    }
}

/// Drive one child to a terminal state.
///
/// Output lines are processed in emission order. On timeout or external
/// cancellation the child is killed and the partial transcript is kept;
/// the caller turns the termination kind into task status and error text.
pub async fn run_session(
    mut session: Box<dyn RunnerSession>,
    req: RunRequest,
) -> Result<RunOutput, RunnerError> {
    let stdout = session
        .stdout()
        .ok_or_else(|| RunnerError::Spawn("no stdout".into()))?;
    let stderr = session
        .stderr()
        .ok_or_else(|| RunnerError::Spawn("no stderr".into()))?;

    if let Some(parent) = req.log_path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RunnerError::Log(e.to_string()))?;
    }
    let file = fs::File::create(&req.log_path)
        .await
        .map_err(|e| RunnerError::Log(e.to_string()))?;

    let ring_out = RingBytes::new(req.capture_bytes);
    let ring_err = RingBytes::new(req.capture_bytes);

    let (line_tx, mut line_rx) = mpsc::channel::<LineTap>(256);
    let out_task = io_pump::pump_stdout(stdout, ring_out.clone(), line_tx.clone());
    let err_task = io_pump::pump_stderr(stderr, ring_err.clone(), line_tx);

    let mut sink = LineSink {
        writer: BufWriter::new(file),
        text: String::new(),
        text_cap: req.capture_bytes.max(4 * 1024),
        session_id: None,
        files: BTreeSet::new(),
    };

    let started = Instant::now();
    let mut cancel = req.cancel;
    let mut termination = Termination::Exited;

    let wait_res: Option<anyhow::Result<i32>> = {
        let wait_fut = session.wait();
        tokio::pin!(wait_fut);
        let timeout_fut = tokio::time::sleep(req.timeout);
        tokio::pin!(timeout_fut);

        let mut lines_open = true;
        let mut cancel_open = true;
        let mut status = None;

        if *cancel.borrow() {
            termination = Termination::Cancelled;
        } else {
            loop {
                tokio::select! {
                    res = &mut wait_fut => {
                        status = Some(res);
                        break;
                    }

                    maybe_tap = line_rx.recv(), if lines_open => {
                        match maybe_tap {
                            Some(tap) => sink.accept(&tap).await,
                            None => lines_open = false,
                        }
                    }

                    _ = &mut timeout_fut => {
                        termination = Termination::TimedOut;
                        break;
                    }

                    changed = cancel.changed(), if cancel_open => {
                        match changed {
                            Ok(()) => {
                                if *cancel.borrow() {
                                    termination = Termination::Cancelled;
                                    break;
                                }
                            }
                            // Sender gone: cancellation can no longer fire.
                            Err(_) => cancel_open = false,
                        }
                    }
                }
            }
        }
        status
    };

    let exit_code = match wait_res {
        Some(res) => res.map_err(|e| RunnerError::Spawn(e.to_string()))?,
        None => {
            if let Err(e) = session.kill().await {
                tracing::debug!(error = %e, "kill after {:?} failed", termination);
            }
            -1
        }
    };

    // Child is gone; drain whatever the pumps still hold. After a kill the
    // pipes may stay open through an orphaned grandchild, so that path
    // gets a bounded grace instead of waiting for EOF that may never come.
    let drain = async {
        while let Some(tap) = line_rx.recv().await {
            sink.accept(&tap).await;
        }
    };
    if termination == Termination::Exited {
        drain.await;
        out_task.await.ok();
        err_task.await.ok();
    } else {
        if tokio::time::timeout(KILL_DRAIN_GRACE, drain).await.is_err() {
            tracing::debug!("output drain cut short after kill");
        }
        out_task.abort();
        err_task.abort();
    }
    let _ = sink.writer.flush().await;

    Ok(RunOutput {
        exit_code,
        termination,
        duration: started.elapsed(),
        session_id: sink.session_id,
        text: sink.text,
        files: sink.files.into_iter().collect(),
        stdout_tail: ring_out.to_string_lossy(),
        stderr_tail: ring_err.to_string_lossy(),
    })
}
