//! Embedded host: the loop on its own thread, reachable through a boundary

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::{HostHandle, HostLoop, HostTask, StatsTimer};
use crate::boundary::Boundary;
use crate::core::config::HostConfig;
use crate::core::error::HostError;
use crate::handle::HandleRegistry;
use crate::os::{platform_display, DisplayEnvironment};
use crate::skin::SkinOrchestrator;

/// A running host for callers that do not own a tokio runtime
pub struct HostRuntime {
    boundary: Boundary,
    handle: HostHandle,
    thread: Option<JoinHandle<()>>,
}

impl HostRuntime {
    /// Start a host against the platform display
    pub fn start(config: HostConfig) -> Result<Self, HostError> {
        Self::start_with(config, platform_display())
    }

    /// Start a host against a given display environment
    pub fn start_with(
        config: HostConfig,
        environment: Box<dyn DisplayEnvironment>,
    ) -> Result<Self, HostError> {
        let (handle, tasks) = HostHandle::channel();
        let registry = Arc::new(HandleRegistry::new());
        let boundary = Boundary::new(Arc::clone(&registry), handle.clone(), config.skins_path());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let loop_handle = handle.clone();
        let thread = thread::Builder::new()
            .name("skinhost".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let mut orchestrator =
                        SkinOrchestrator::new(&config, environment).with_registry(registry);
                    orchestrator.initialize();

                    let timer = StatsTimer::spawn(loop_handle.clone(), config.stats_interval());
                    HostLoop::new(orchestrator, loop_handle, tasks).run().await;
                    timer.abort();
                });
            })?;

        tracing::info!("Host runtime started");
        Ok(Self {
            boundary,
            handle,
            thread: Some(thread),
        })
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn handle(&self) -> &HostHandle {
        &self.handle
    }

    /// Post `Shutdown` and wait for finalization
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if self.handle.post(HostTask::Shutdown).is_err() {
            tracing::debug!("Host loop already stopped");
        }
        if thread.join().is_err() {
            tracing::error!("Host thread panicked");
        }
        tracing::info!("Host runtime stopped");
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for HostRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}
