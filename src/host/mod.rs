//! Host Execution Context
//!
//! The orchestrator lives on exactly one task. Everything that wants to
//! change skin state (the boundary, the statistics timer, Ctrl-C, deferred
//! closes) posts a [`HostTask`] through a [`HostHandle`]; [`HostLoop`]
//! consumes the queue in FIFO order.

mod runtime;

pub use runtime::HostRuntime;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::core::error::{log_failure, HostError};
use crate::skin::{SkinId, SkinOrchestrator};

/// Work item for the owning context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTask {
    RefreshAll,
    ExecuteCommand {
        command: String,
        scope: Option<SkinId>,
    },
    /// Periodic statistics sample and throttled write
    FlushStats,
    /// A deferred teardown finished
    SkinClosed(SkinId),
    Activate(PathBuf),
    Deactivate(SkinId),
    Toggle(PathBuf),
    LoadLayout(Option<PathBuf>),
    Shutdown,
}

/// Cloneable sender side of the task queue
#[derive(Debug, Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostTask>,
}

impl HostHandle {
    /// New queue; the receiver goes to [`HostLoop::new`]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn post(&self, task: HostTask) -> Result<(), HostError> {
        self.tx.send(task).map_err(|_| HostError::HostUnavailable)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumes host tasks against the orchestrator
pub struct HostLoop {
    orchestrator: SkinOrchestrator,
    handle: HostHandle,
    tasks: mpsc::UnboundedReceiver<HostTask>,
}

impl HostLoop {
    pub fn new(
        orchestrator: SkinOrchestrator,
        handle: HostHandle,
        tasks: mpsc::UnboundedReceiver<HostTask>,
    ) -> Self {
        Self {
            orchestrator,
            handle,
            tasks,
        }
    }

    pub fn orchestrator(&self) -> &SkinOrchestrator {
        &self.orchestrator
    }

    /// Run until `Shutdown`, then finalize. Hands the orchestrator back.
    pub async fn run(mut self) -> SkinOrchestrator {
        tracing::info!("Host loop started");

        while let Some(task) = self.tasks.recv().await {
            if !self.dispatch(task) {
                break;
            }
            self.schedule_closes();
        }

        self.tasks.close();
        self.orchestrator.finalize();
        tracing::info!("Host loop stopped");
        self.orchestrator
    }

    /// Apply one task. Returns `false` on shutdown.
    pub fn dispatch(&mut self, task: HostTask) -> bool {
        tracing::debug!(?task, "Host task");
        let orchestrator = &mut self.orchestrator;

        match task {
            HostTask::RefreshAll => orchestrator.refresh_all(),
            HostTask::ExecuteCommand { command, scope } => {
                orchestrator.execute_command(&command, scope);
            }
            HostTask::FlushStats => orchestrator.flush_stats(),
            HostTask::SkinClosed(id) => orchestrator.skin_closed(id),
            HostTask::Activate(path) => {
                if let Err(e) = orchestrator.activate_skin(&path) {
                    log_failure(&format!("Activation of {} failed", path.display()), &e);
                }
            }
            HostTask::Deactivate(id) => {
                if let Err(e) = orchestrator.deactivate_skin(id) {
                    log_failure(&format!("Deactivation of {} failed", id), &e);
                }
            }
            HostTask::Toggle(path) => {
                if let Err(e) = orchestrator.toggle_skin(&path) {
                    log_failure(&format!("Toggle of {} failed", path.display()), &e);
                }
            }
            HostTask::LoadLayout(path) => {
                if let Err(e) = orchestrator.load_layout(path.as_deref()) {
                    log_failure("Layout not loaded", &e);
                }
            }
            HostTask::Shutdown => return false,
        }
        true
    }

    /// Turn deferred teardowns into delayed `SkinClosed` tasks
    fn schedule_closes(&mut self) {
        for (id, delay) in self.orchestrator.take_scheduled_closes() {
            let handle = self.handle.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if handle.post(HostTask::SkinClosed(id)).is_err() {
                    tracing::debug!(id = %id, "Host gone before deferred close");
                }
            });
        }
    }
}

/// Periodic source of `FlushStats` tasks. It never touches the
/// orchestrator itself.
pub struct StatsTimer;

impl StatsTimer {
    /// Post `FlushStats` every `period` until the queue closes
    pub fn spawn(handle: HostHandle, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                if handle.post(HostTask::FlushStats).is_err() {
                    tracing::debug!("Statistics timer stopped");
                    break;
                }
            }
        })
    }
}

/// Post `Shutdown` on Ctrl-C
pub fn spawn_ctrl_c(handle: HostHandle) -> JoinHandle<()> {
    spawn_shutdown_on(handle, tokio::signal::ctrl_c())
}

/// Post `Shutdown` once `signal` resolves
fn spawn_shutdown_on<S>(handle: HostHandle, signal: S) -> JoinHandle<()>
where
    S: Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => {
                tracing::info!("Interrupt received, shutting down");
                if handle.post(HostTask::Shutdown).is_err() {
                    tracing::debug!("Host loop already stopped");
                }
            }
            Err(e) => tracing::warn!("Cannot listen for Ctrl-C: {}", e),
        }
    })
}
