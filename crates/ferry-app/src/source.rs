//! Filesystem change notifications.
//!
//! The dispatcher only sees [`Notification`] values arriving on a channel and
//! a [`ChangeSource`] it can register directories with, so tests can drive it
//! without touching inotify.

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;

/// Capacity of the channel between the watcher backend and the dispatcher.
pub const NOTIFICATION_BUFFER: usize = 100;

/// Errors raised by change sources.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The watcher backend could not be created.
    #[error("failed to create watcher")]
    Create {
        /// Underlying notify error.
        source: notify::Error,
    },
    /// A directory could not be registered.
    #[error("failed to register watch")]
    Register {
        /// Directory that could not be watched.
        path: PathBuf,
        /// Underlying notify error.
        source: notify::Error,
    },
    /// The backend reported an error after startup.
    #[error("change subscription failed")]
    Subscription {
        /// Underlying notify error.
        source: notify::Error,
    },
}

/// A message from a change source.
#[derive(Debug)]
pub enum Notification {
    /// A file was completed inside a watched directory.
    Changed(PathBuf),
    /// The subscription broke; no further notifications will be trustworthy.
    Failed(WatchError),
}

/// Something directories can be registered with.
pub trait ChangeSource: Send {
    /// Start watching `dir` (non-recursively).
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Register`] if the directory cannot be watched.
    fn register(&mut self, dir: &Path) -> Result<(), WatchError>;
}

/// Change source backed by the platform watcher (inotify on Linux).
pub struct NotifySource {
    watcher: RecommendedWatcher,
}

impl NotifySource {
    /// Create the watcher and the channel its notifications arrive on.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Create`] if the backend cannot be initialised.
    pub fn new() -> Result<(Self, mpsc::Receiver<Notification>), WatchError> {
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Some(notification) = translate(res) {
                let _ = tx.blocking_send(notification);
            }
        })
        .map_err(|source| WatchError::Create { source })?;
        Ok((Self { watcher }, rx))
    }
}

impl ChangeSource for NotifySource {
    fn register(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Register {
                path: dir.to_path_buf(),
                source,
            })
    }
}

/// Map a backend event onto a notification.
///
/// Only "file completed" events are forwarded: a writer closing the file, or
/// a file being renamed into the directory. Everything else is `None`.
#[must_use]
pub fn translate(res: notify::Result<notify::Event>) -> Option<Notification> {
    match res {
        Ok(event) => completed_path(&event).map(Notification::Changed),
        Err(source) => Some(Notification::Failed(WatchError::Subscription { source })),
    }
}

fn completed_path(event: &notify::Event) -> Option<PathBuf> {
    match event.kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write))
        | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.first().cloned(),
        // inotify reports a move within watched dirs as `To` and again as `Both`
        _ => None,
    }
}
