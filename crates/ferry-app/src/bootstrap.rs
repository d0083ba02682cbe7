//! Process wiring: logging, watcher, uploader, dispatcher.

use std::sync::Arc;

use ferry_config::AgentConfig;
use ferry_events::EventBus;
use ferry_telemetry::{GlobalContextGuard, LoggingConfig};
use ferry_upload::Uploader;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::Cli;
use crate::dispatcher::Dispatcher;
use crate::error::{AppError, AppResult};
use crate::source::{ChangeSource, Notification, NotifySource};

/// Dependencies required to run the agent.
pub struct BootstrapDependencies {
    logging: LoggingConfig<'static>,
    config: Arc<AgentConfig>,
    events: EventBus,
}

impl BootstrapDependencies {
    /// Validate parsed arguments into runtime dependencies.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when the arguments do not form a valid configuration.
    pub fn from_cli(cli: Cli) -> AppResult<Self> {
        let logging = cli.logging();
        let config = cli
            .into_config()
            .map_err(|err| AppError::config("cli.into_config", err))?;
        Ok(Self {
            logging,
            config: Arc::new(config),
            events: EventBus::new(),
        })
    }
}

/// Entry point for the agent: install logging, create the platform watcher,
/// and run the dispatcher until a fatal error.
///
/// # Errors
///
/// Returns an error if logging cannot be installed, the watcher cannot be
/// created, or the dispatcher stops.
pub async fn run_app(dependencies: BootstrapDependencies) -> AppResult<()> {
    ferry_telemetry::init_logging(&dependencies.logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("agent");

    info!(
        destination = %dependencies.config.destination,
        include = dependencies.config.include.as_str(),
        dirs = dependencies.config.watch_dirs.len(),
        keep_files = dependencies.config.keep_files,
        "ferry agent starting"
    );

    let (source, notifications) =
        NotifySource::new().map_err(|err| AppError::watch("watcher.new", err))?;
    run_app_with(dependencies.config, dependencies.events, source, notifications).await
}

/// Boot sequence over injected collaborators.
///
/// # Errors
///
/// Returns an error if the uploader cannot be built or the dispatcher stops.
pub async fn run_app_with<S: ChangeSource>(
    config: Arc<AgentConfig>,
    events: EventBus,
    source: S,
    notifications: mpsc::Receiver<Notification>,
) -> AppResult<()> {
    let uploader = Uploader::new(Arc::clone(&config), events.clone())
        .map_err(|err| AppError::upload("uploader.new", err))?;
    Dispatcher::new(config, uploader, events)
        .run(source, notifications)
        .await
}
