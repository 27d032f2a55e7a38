//! Runner for the record command

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::application::ports::{AudioCapture, ConfigStore, NodeWidgets};
use crate::application::{spawn_recorder, RecorderClosed, RecorderHandle};
use crate::domain::config::AppConfig;
use crate::domain::node::{WidgetValue, MAX_DURATION_WIDGET};
use crate::domain::payload::PayloadError;
use crate::domain::recorder::{MaxDuration, RecorderState};
use crate::infrastructure::{CpalCapture, MemoryNode, XdgConfigStore};

use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;
pub const EXIT_CANCELLED: u8 = 130;

/// How long to wait for the recorder to accept the start request
const START_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for the payload once the stream has stopped
const FINALIZE_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved options for one recording
#[derive(Debug, Clone, Default)]
pub struct RecordOptions {
    /// Overrides the node's `record_duration_max` input when set
    pub max_duration: Option<MaxDuration>,
    pub output: Option<PathBuf>,
    pub node: Option<PathBuf>,
}

/// Errors ending a CLI run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid node JSON: {0}")]
    NodeJson(#[from] serde_json::Error),

    #[error("No audio input device available")]
    CaptureUnavailable,

    #[error("Microphone did not start recording")]
    NotStarted,

    #[error("Recording produced no audio")]
    NoAudio,

    #[error("Timed out waiting for the recording to finish")]
    FinalizeTimeout,

    #[error("Recording cancelled")]
    Cancelled,

    #[error("Node has no recorded audio")]
    NoPayload,

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Closed(#[from] RecorderClosed),
}

/// Load config merged from defaults, the config file and CLI overrides
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    XdgConfigStore::new().resolve(cli_config).await
}

/// Record one clip into a node and write the serialized node
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    match record(CpalCapture::new(), options, &mut presenter).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(RunError::Cancelled) => {
            presenter.stop_spinner();
            presenter.warn("Recording cancelled");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            presenter.spinner_fail("Recording failed");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Record with the given capture backend
pub async fn record<C: AudioCapture>(
    capture: C,
    options: RecordOptions,
    presenter: &mut Presenter,
) -> Result<(), RunError> {
    let mut node = load_node(options.node.as_deref()).await?;
    if let Some(max_duration) = options.max_duration {
        node.set_widget_value(
            MAX_DURATION_WIDGET,
            WidgetValue::Number(max_duration.as_secs() as f64),
        );
    }
    let total = MaxDuration::from_widget(node.widget_value(MAX_DURATION_WIDGET).as_ref());

    if !capture.is_available() {
        return Err(RunError::CaptureUnavailable);
    }

    let handle = spawn_recorder(capture, node);
    let result = drive(&handle, presenter, total, spawn_enter_listener()).await;
    let node = handle.remove().await?;
    result?;

    presenter.spinner_success("Recording complete");
    let json = node.to_json()?;
    write_output(options.output.as_deref(), &json, presenter).await
}

/// Run one session to completion: start, stop on Enter or countdown, then
/// wait for the payload.
async fn drive<N: NodeWidgets>(
    handle: &RecorderHandle<N>,
    presenter: &mut Presenter,
    total: MaxDuration,
    mut enter: mpsc::UnboundedReceiver<()>,
) -> Result<(), RunError> {
    let mut status = handle.subscribe();
    let (started_before, published_before) = {
        let current = status.borrow();
        (current.started, current.published)
    };

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    presenter.start_spinner("Waiting for microphone...");
    handle.start().await?;

    // A refused start leaves the status untouched, so only the timeout ends it
    let accepted = tokio::select! {
        result = tokio::time::timeout(START_TIMEOUT, async {
            status
                .wait_for(|s| s.started > started_before || s.removed)
                .await
                .map(|s| s.started)
        }) => result,
        _ = &mut ctrl_c => return Err(RunError::Cancelled),
    };
    match accepted {
        Ok(Ok(started)) if started > started_before => {}
        Ok(Err(_)) => return Err(RecorderClosed.into()),
        _ => return Err(RunError::NotStarted),
    }

    let mut captured = false;
    let mut enter_open = true;

    loop {
        let current = status.borrow_and_update().clone();
        if let Some(remaining) = current.remaining_secs {
            captured = true;
            presenter.update_countdown(remaining, total.as_secs());
        }
        if current.state == RecorderState::Idle {
            break;
        }

        tokio::select! {
            changed = status.changed() => changed.map_err(|_| RecorderClosed)?,
            line = enter.recv(), if enter_open => match line {
                Some(()) => handle.stop().await?,
                None => enter_open = false,
            },
            _ = &mut ctrl_c => return Err(RunError::Cancelled),
        }
    }

    if !captured {
        return Err(RunError::NotStarted);
    }

    presenter.update_spinner("Encoding...");
    let published = tokio::time::timeout(FINALIZE_TIMEOUT, async {
        status
            .wait_for(|s| s.published > published_before || s.is_settled())
            .await
            .map(|s| s.published)
    })
    .await
    .map_err(|_| RunError::FinalizeTimeout)?
    .map_err(|_| RecorderClosed)?;

    if published == published_before {
        return Err(RunError::NoAudio);
    }
    Ok(())
}

/// Forward each line typed on stdin as a stop request.
///
/// Reads on a detached thread so a pending read never holds up shutdown.
fn spawn_enter_listener() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("stdin-listener".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if line.is_err() || tx.send(()).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Enter to stop is unavailable");
    }
    rx
}

/// Load a saved node, or create a fresh one
pub async fn load_node(path: Option<&Path>) -> Result<MemoryNode, RunError> {
    let Some(path) = path else {
        return Ok(MemoryNode::new());
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RunError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(MemoryNode::from_json(&json)?)
}

async fn write_output(
    path: Option<&Path>,
    json: &str,
    presenter: &Presenter,
) -> Result<(), RunError> {
    match path {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .map_err(|source| RunError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            presenter.success(&format!("Node written to {}", path.display()));
        }
        None => presenter.output(json),
    }
    Ok(())
}
