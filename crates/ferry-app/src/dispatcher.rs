//! The event loop turning change notifications into upload tasks.

use std::path::PathBuf;
use std::sync::Arc;

use ferry_config::AgentConfig;
use ferry_events::{Event, EventBus};
use ferry_fsops::{FileMatcher, scan_directory};
use ferry_upload::{UploadOutcome, Uploader, clean_path};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::limiter::{Admission, UploadLimiter};
use crate::source::{ChangeSource, Notification};

/// The check-and-upload path shared by live notifications and the initial scan.
#[derive(Clone)]
pub struct Pipeline {
    matcher: FileMatcher,
    uploader: Uploader,
}

impl Pipeline {
    /// Combine a matcher and an uploader.
    #[must_use]
    pub const fn new(matcher: FileMatcher, uploader: Uploader) -> Self {
        Self { matcher, uploader }
    }

    /// Clean `path`, check it, and upload it when it matches.
    ///
    /// Returns `None` for paths the matcher rejects.
    pub async fn handle(&self, path: PathBuf) -> Option<UploadOutcome> {
        let path = clean_path(&path);
        let matcher = self.matcher.clone();
        let checked = path.clone();
        let matched = tokio::task::spawn_blocking(move || matcher.matches(&checked))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "match check task failed");
                false
            });
        if !matched {
            return None;
        }
        debug!(path = %path.display(), "handling");
        Some(self.uploader.upload(&path).await)
    }
}

/// Owns the loop that consumes notifications and fans them out to tasks.
pub struct Dispatcher {
    config: Arc<AgentConfig>,
    pipeline: Pipeline,
    limiter: UploadLimiter,
    events: EventBus,
}

impl Dispatcher {
    /// Assemble a dispatcher from validated configuration.
    #[must_use]
    pub fn new(config: Arc<AgentConfig>, uploader: Uploader, events: EventBus) -> Self {
        let matcher = FileMatcher::new(config.include.clone());
        let limiter = UploadLimiter::new(config.limits);
        Self {
            config,
            pipeline: Pipeline::new(matcher, uploader),
            limiter,
            events,
        }
    }

    /// Register every watch directory, start the initial scans, and process
    /// notifications until a fatal error occurs.
    ///
    /// `source` is held for the lifetime of the loop so its watches stay
    /// active.
    ///
    /// # Errors
    ///
    /// Returns an error when a directory cannot be registered, an initial scan
    /// fails, the subscription reports an error, or the notification channel
    /// closes. Individual upload failures are never returned.
    pub async fn run<S: ChangeSource>(
        self,
        mut source: S,
        mut notifications: mpsc::Receiver<Notification>,
    ) -> AppResult<()> {
        for dir in &self.config.watch_dirs {
            source
                .register(dir)
                .map_err(|err| AppError::watch("register", err))?;
            info!(dir = %dir.display(), "watching directory");
            self.events.publish(Event::WatchRegistered {
                dir: dir.display().to_string(),
            });
        }

        let mut scans = JoinSet::new();
        if self.config.initial_scan {
            for dir in &self.config.watch_dirs {
                scans.spawn(self.scan(dir.clone()));
            }
        }

        loop {
            tokio::select! {
                notification = notifications.recv() => match notification {
                    Some(Notification::Changed(path)) => self.dispatch(path),
                    Some(Notification::Failed(err)) => {
                        return Err(AppError::watch("subscription", err));
                    }
                    None => return Err(AppError::NotificationsClosed),
                },
                Some(joined) = scans.join_next(), if !scans.is_empty() => match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => return Err(AppError::fsops("scan", err)),
                    Err(err) => return Err(AppError::task("scan", err)),
                },
            }
        }
    }

    fn dispatch(&self, path: PathBuf) {
        let admission = self.limiter.admit();
        if matches!(admission, Admission::Rejected) {
            warn!(path = %path.display(), "upload limit reached; dropping notification");
            self.events.publish(Event::NotificationDropped {
                path: path.display().to_string(),
            });
            return;
        }

        let pipeline = self.pipeline.clone();
        tokio::spawn(async move {
            let _permit = admission.wait().await;
            pipeline.handle(path).await;
        });
    }

    fn scan(
        &self,
        dir: PathBuf,
    ) -> impl Future<Output = Result<(), ferry_fsops::FsOpsError>> + Send + 'static {
        let pipeline = self.pipeline.clone();
        let limiter = self.limiter.clone();
        let events = self.events.clone();
        async move {
            let entries = scan_directory(&dir, |path| {
                let pipeline = pipeline.clone();
                let limiter = limiter.clone();
                async move {
                    let _permit = limiter.acquire().await;
                    pipeline.handle(path).await;
                }
            })
            .await?;
            debug!(dir = %dir.display(), entries, "initial scan finished");
            events.publish(Event::ScanCompleted {
                dir: dir.display().to_string(),
                entries,
            });
            Ok(())
        }
    }
}
