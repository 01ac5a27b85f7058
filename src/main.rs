//! SkinHost - standalone host process
//!
//! Loads the layout, keeps skins alive until Ctrl-C, then finalizes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use skinhost::core::config::HostConfig;
use skinhost::handle::HandleRegistry;
use skinhost::host::{spawn_ctrl_c, HostHandle, HostLoop, StatsTimer};
use skinhost::logging::{LogLevel, LoggingSystem};
use skinhost::os::platform_display;
use skinhost::skin::SkinOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = std::env::args_os().nth(1).map(PathBuf::from);
    let config = HostConfig::load(settings.as_deref()).context("loading host configuration")?;

    let logging_config = if config.debug {
        config.logging.clone().with_level(LogLevel::Debug)
    } else {
        config.logging.clone()
    };

    // Keep the file writer alive for the whole run
    let _logging_system = match LoggingSystem::init(logging_config) {
        Ok(system) => Some(system),
        Err(e) => {
            eprintln!("Failed to initialize logging system: {}. Using basic logging.", e);
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                )
                .init();
            None
        }
    };

    tracing::info!("Starting SkinHost...");
    if let Ok(dump) = serde_json::to_string(&config) {
        tracing::debug!(config = %dump, "Effective configuration");
    }

    let (handle, tasks) = HostHandle::channel();
    let registry = Arc::new(HandleRegistry::new());
    let mut orchestrator =
        SkinOrchestrator::new(&config, platform_display()).with_registry(registry);
    orchestrator.initialize();
    tracing::info!(skins = orchestrator.window_count(), "Layout loaded");

    let timer = StatsTimer::spawn(handle.clone(), config.stats_interval());
    let interrupt = spawn_ctrl_c(handle.clone());

    HostLoop::new(orchestrator, handle, tasks).run().await;

    timer.abort();
    interrupt.abort();
    tracing::info!("SkinHost stopped");
    Ok(())
}
