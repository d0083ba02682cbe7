//! Event payload types emitted by the agent.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier assigned to each event published on the bus.
pub type EventId = u64;

/// Events buffered per subscriber before a slow subscriber starts skipping.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Point in an upload task at which a failure occurred.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The source file could not be opened.
    Open,
    /// The request never produced a response (includes body construction failures).
    Transport,
}

/// Typed events describing what the agent did with each file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A directory was registered with the change source.
    WatchRegistered {
        /// Directory now being watched.
        dir: String,
    },
    /// The initial scan of a directory finished.
    ScanCompleted {
        /// Directory that was scanned.
        dir: String,
        /// Number of entries fed through the check-and-upload path.
        entries: usize,
    },
    /// A notification was dropped because the upload limiter was saturated.
    NotificationDropped {
        /// Path carried by the dropped notification.
        path: String,
    },
    /// A matched file started uploading.
    UploadStarted {
        /// Identifier of the upload task.
        task_id: Uuid,
        /// Path being uploaded.
        path: String,
    },
    /// The destination accepted the upload (status below 400).
    UploadDelivered {
        /// Identifier of the upload task.
        task_id: Uuid,
        /// Path that was uploaded.
        path: String,
        /// HTTP status returned by the destination.
        status: u16,
        /// Lowercase hex SHA-1 sent alongside the content.
        sha1: String,
    },
    /// The destination answered with status 400 or above.
    UploadRejected {
        /// Identifier of the upload task.
        task_id: Uuid,
        /// Path that was uploaded.
        path: String,
        /// HTTP status returned by the destination.
        status: u16,
        /// Leading bytes of the response body.
        excerpt: String,
    },
    /// The upload could not be attempted or did not produce a response.
    UploadFailed {
        /// Identifier of the upload task.
        task_id: Uuid,
        /// Path that was being uploaded.
        path: String,
        /// Where the failure happened.
        stage: FailureStage,
        /// Human-readable error detail.
        message: String,
    },
    /// The uploaded file was deleted.
    FileRemoved {
        /// Identifier of the upload task.
        task_id: Uuid,
        /// Path that was deleted.
        path: String,
    },
    /// Deleting the uploaded file failed; the file may remain.
    RemoveFailed {
        /// Identifier of the upload task.
        task_id: Uuid,
        /// Path that could not be deleted.
        path: String,
        /// Human-readable error detail.
        message: String,
    },
}

impl Event {
    /// Machine-friendly discriminator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WatchRegistered { .. } => "watch_registered",
            Self::ScanCompleted { .. } => "scan_completed",
            Self::NotificationDropped { .. } => "notification_dropped",
            Self::UploadStarted { .. } => "upload_started",
            Self::UploadDelivered { .. } => "upload_delivered",
            Self::UploadRejected { .. } => "upload_rejected",
            Self::UploadFailed { .. } => "upload_failed",
            Self::FileRemoved { .. } => "file_removed",
            Self::RemoveFailed { .. } => "remove_failed",
        }
    }

    /// Upload task this event belongs to, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<Uuid> {
        match self {
            Self::UploadStarted { task_id, .. }
            | Self::UploadDelivered { task_id, .. }
            | Self::UploadRejected { task_id, .. }
            | Self::UploadFailed { task_id, .. }
            | Self::FileRemoved { task_id, .. }
            | Self::RemoveFailed { task_id, .. } => Some(*task_id),
            Self::WatchRegistered { .. }
            | Self::ScanCompleted { .. }
            | Self::NotificationDropped { .. } => None,
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Monotonic identifier assigned to the wrapped event.
    pub id: EventId,
    /// Timestamp recording when the envelope was produced.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event payload.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_maps_variants() {
        let task_id = Uuid::nil();
        let cases = [
            (
                Event::WatchRegistered { dir: "/in".into() },
                "watch_registered",
            ),
            (
                Event::UploadDelivered {
                    task_id,
                    path: "/in/a.csv".into(),
                    status: 200,
                    sha1: "00".into(),
                },
                "upload_delivered",
            ),
            (
                Event::UploadFailed {
                    task_id,
                    path: "/in/a.csv".into(),
                    stage: FailureStage::Transport,
                    message: "refused".into(),
                },
                "upload_failed",
            ),
            (
                Event::NotificationDropped {
                    path: "/in/b.csv".into(),
                },
                "notification_dropped",
            ),
        ];
        for (event, kind) in cases {
            assert_eq!(event.kind(), kind);
        }
    }

    #[test]
    fn task_id_is_exposed_for_upload_events() {
        let task_id = Uuid::from_u128(7);
        let removed = Event::FileRemoved {
            task_id,
            path: "/in/a.csv".into(),
        };
        assert_eq!(removed.task_id(), Some(task_id));
        let scan = Event::ScanCompleted {
            dir: "/in".into(),
            entries: 3,
        };
        assert_eq!(scan.task_id(), None);
    }

    #[test]
    fn events_serialize_with_type_tag() -> Result<(), serde_json::Error> {
        let event = Event::UploadRejected {
            task_id: Uuid::nil(),
            path: "/in/a.csv".into(),
            status: 500,
            excerpt: "disk full".into(),
        };
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["type"], "upload_rejected");
        assert_eq!(json["status"], 500);
        Ok(())
    }
}
