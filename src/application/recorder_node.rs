//! Recorder node event loop
//!
//! Runs one [`RecorderController`] on its own task. User commands,
//! countdown ticks and capture completions are processed one at a time,
//! so the controller never needs a lock.

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};

use crate::domain::recorder::{SessionId, TICK_INTERVAL};

use super::ports::{AudioCapture, NodeWidgets};
use super::recorder::{RecorderController, RecorderEvent, RecorderStatus};

const COMMAND_BUFFER: usize = 16;

/// Commands accepted by a running recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderCommand {
    /// Start if idle, stop if recording (button click)
    Toggle,
    Start,
    Stop,
    /// The node was removed from the graph
    Remove,
}

/// Error when the recorder task is gone
#[derive(Debug, Clone, Error)]
#[error("Recorder node has been removed")]
pub struct RecorderClosed;

/// Handle to a running recorder node
pub struct RecorderHandle<N> {
    commands: mpsc::Sender<RecorderCommand>,
    status: watch::Receiver<RecorderStatus>,
    task: JoinHandle<N>,
}

impl<N> RecorderHandle<N>
where
    N: NodeWidgets,
{
    /// Start if idle, stop if recording
    pub async fn toggle(&self) -> Result<(), RecorderClosed> {
        self.send(RecorderCommand::Toggle).await
    }

    /// Begin a session (no-op while recording)
    pub async fn start(&self) -> Result<(), RecorderClosed> {
        self.send(RecorderCommand::Start).await
    }

    /// End the session (no-op while idle)
    pub async fn stop(&self) -> Result<(), RecorderClosed> {
        self.send(RecorderCommand::Stop).await
    }

    /// Latest status snapshot
    pub fn status(&self) -> RecorderStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<RecorderStatus> {
        self.status.clone()
    }

    /// Remove the node: tear the recorder down and hand the node back
    pub async fn remove(self) -> Result<N, RecorderClosed> {
        // the task also tears down when the channel closes
        let _ = self.commands.send(RecorderCommand::Remove).await;
        self.task.await.map_err(|_| RecorderClosed)
    }

    async fn send(&self, command: RecorderCommand) -> Result<(), RecorderClosed> {
        self.commands.send(command).await.map_err(|_| RecorderClosed)
    }
}

/// Attach a recorder to `node` and run it on a new task
pub fn spawn_recorder<C, N>(capture: C, node: N) -> RecorderHandle<N>
where
    C: AudioCapture,
    N: NodeWidgets,
{
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut controller = RecorderController::new(capture, node, event_tx);
    controller.attach();

    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (status_tx, status_rx) = watch::channel(controller.status());
    let task = tokio::spawn(run(controller, command_rx, event_rx, status_tx));

    RecorderHandle {
        commands: command_tx,
        status: status_rx,
        task,
    }
}

/// Countdown timer bound to the session it was armed for
struct Ticker {
    session: SessionId,
    interval: Interval,
}

async fn run<C, N>(
    mut controller: RecorderController<C, N>,
    mut commands: mpsc::Receiver<RecorderCommand>,
    mut events: mpsc::UnboundedReceiver<RecorderEvent>,
    status: watch::Sender<RecorderStatus>,
) -> N
where
    C: AudioCapture,
    N: NodeWidgets,
{
    let mut ticker: Option<Ticker> = None;

    loop {
        sync_ticker(controller.countdown_session(), &mut ticker);
        publish_status(&status, controller.status());

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(RecorderCommand::Toggle) => controller.toggle(),
                Some(RecorderCommand::Start) => controller.start(),
                Some(RecorderCommand::Stop) => controller.stop(),
                Some(RecorderCommand::Remove) | None => break,
            },
            Some(event) = events.recv() => controller.handle_event(event),
            () = next_tick(&mut ticker) => controller.on_tick(),
        }
    }

    controller.remove();
    publish_status(&status, controller.status());
    controller.into_node()
}

/// Arm a fresh one-second interval when a new session starts counting
/// down; drop it as soon as no countdown runs.
fn sync_ticker(countdown_session: Option<SessionId>, ticker: &mut Option<Ticker>) {
    match countdown_session {
        Some(session) if ticker.as_ref().map(|t| t.session) == Some(session) => {}
        Some(session) => {
            *ticker = Some(Ticker {
                session,
                interval: interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL),
            });
        }
        None => *ticker = None,
    }
}

async fn next_tick(ticker: &mut Option<Ticker>) {
    match ticker {
        Some(ticker) => {
            ticker.interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn publish_status(status: &watch::Sender<RecorderStatus>, next: RecorderStatus) {
    status.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}
