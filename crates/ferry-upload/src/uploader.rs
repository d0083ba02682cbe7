//! Streaming upload of one file and the keep/delete policy that follows it.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use ferry_config::AgentConfig;
use ferry_events::{Event, EventBus, FailureStage};
use ferry_telemetry::upload_span;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use tokio::io::AsyncRead;
use tracing::{Instrument, debug, error, info};
use uuid::Uuid;

use crate::body::{BodySource, spawn_body_producer};
use crate::error::{UploadError, UploadResult, error_chain};
use crate::multipart::MultipartEncoder;
use crate::outcome::{Disposition, EXCERPT_LIMIT, UploadOutcome};

/// Uploads files to the configured destination.
///
/// Cheap to clone; clones share the HTTP connection pool and the event bus.
#[derive(Clone)]
pub struct Uploader {
    client: Client,
    config: Arc<AgentConfig>,
    events: EventBus,
}

impl Uploader {
    /// Build an uploader with a client honouring the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::ClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(config: Arc<AgentConfig>, events: EventBus) -> UploadResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|source| UploadError::ClientBuild { source })?;
        Ok(Self::with_client(client, config, events))
    }

    /// Build an uploader around an existing client.
    #[must_use]
    pub const fn with_client(client: Client, config: Arc<AgentConfig>, events: EventBus) -> Self {
        Self {
            client,
            config,
            events,
        }
    }

    /// Shared configuration.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Upload `path` under a fresh task identifier.
    pub async fn upload(&self, path: &Path) -> UploadOutcome {
        self.upload_task(Uuid::new_v4(), path).await
    }

    /// Upload `path` as task `task_id`.
    ///
    /// Never returns an error: every failure is logged, published on the event
    /// bus and reflected in the returned outcome. The file is only deleted
    /// after a status below 400 and only when keep-files is off.
    pub async fn upload_task(&self, task_id: Uuid, path: &Path) -> UploadOutcome {
        let span = upload_span(task_id, path);
        self.run(task_id, &clean_path(path)).instrument(span).await
    }

    async fn run(&self, task_id: Uuid, path: &Path) -> UploadOutcome {
        let shown = path.to_string_lossy().into_owned();
        self.events.publish(Event::UploadStarted {
            task_id,
            path: shown.clone(),
        });

        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(err) => {
                let message = error_chain(&UploadError::io("open", path, err));
                error!(error = %message, "failed to open file");
                self.publish_failure(task_id, shown, FailureStage::Open, message.clone());
                return UploadOutcome::OpenFailed { message };
            }
        };

        self.deliver(task_id, path, file).await
    }

    async fn deliver<R>(&self, task_id: Uuid, path: &Path, reader: R) -> UploadOutcome
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let shown = path.to_string_lossy().into_owned();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let encoder = MultipartEncoder::new();
        let source = BodySource {
            path: path.to_path_buf(),
            filename,
            path_field: shown.clone(),
        };
        let (body, digest) = spawn_body_producer(reader, encoder.clone(), source).into_parts();

        debug!(destination = %self.config.destination, "posting file");
        let sent = self
            .client
            .post(self.config.destination.clone())
            .header(CONTENT_TYPE, encoder.content_type())
            .body(body)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(source) => {
                let message = match digest.await {
                    Ok(Err(producer @ UploadError::Io { .. })) => error_chain(&producer),
                    _ => error_chain(&UploadError::Transport { source }),
                };
                error!(error = %message, "upload failed");
                self.publish_failure(task_id, shown, FailureStage::Transport, message.clone());
                return UploadOutcome::TransportFailed { message };
            }
        };

        let status = response.status();
        if !is_success(status) {
            let excerpt = read_excerpt(response).await;
            error!(status = status.as_u16(), body = %excerpt, "destination rejected upload");
            self.events.publish(Event::UploadRejected {
                task_id,
                path: shown,
                status: status.as_u16(),
                excerpt: excerpt.clone(),
            });
            return UploadOutcome::Rejected { status, excerpt };
        }

        let sha1 = match digest.await {
            Ok(Ok(sha1)) => sha1,
            Ok(Err(err)) => return self.incomplete_body(task_id, shown, &err),
            Err(source) => {
                return self.incomplete_body(task_id, shown, &UploadError::Producer { source });
            }
        };
        debug!(status = status.as_u16(), sha1 = %sha1, "upload delivered");
        self.events.publish(Event::UploadDelivered {
            task_id,
            path: shown.clone(),
            status: status.as_u16(),
            sha1: sha1.clone(),
        });

        let disposition = if self.config.keep_files {
            debug!("keeping file");
            Disposition::Kept
        } else {
            self.remove(task_id, path, shown).await
        };

        UploadOutcome::Delivered {
            status,
            sha1,
            disposition,
        }
    }

    fn incomplete_body(&self, task_id: Uuid, shown: String, err: &UploadError) -> UploadOutcome {
        let message = error_chain(err);
        error!(error = %message, "destination responded before the body was complete");
        self.publish_failure(task_id, shown, FailureStage::Transport, message.clone());
        UploadOutcome::TransportFailed { message }
    }

    async fn remove(&self, task_id: Uuid, path: &Path, shown: String) -> Disposition {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!(path = %shown, "removed");
                self.events.publish(Event::FileRemoved {
                    task_id,
                    path: shown,
                });
                Disposition::Removed
            }
            Err(err) => {
                let message = error_chain(&UploadError::io("remove", path, err));
                error!(error = %message, "failed to remove uploaded file");
                self.events.publish(Event::RemoveFailed {
                    task_id,
                    path: shown,
                    message,
                });
                Disposition::RemoveFailed
            }
        }
    }

    fn publish_failure(&self, task_id: Uuid, path: String, stage: FailureStage, message: String) {
        self.events.publish(Event::UploadFailed {
            task_id,
            path,
            stage,
            message,
        });
    }
}

async fn read_excerpt(mut response: Response) -> String {
    let mut excerpt = Vec::with_capacity(EXCERPT_LIMIT);
    while excerpt.len() < EXCERPT_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(EXCERPT_LIMIT - excerpt.len());
                excerpt.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(err) => {
                debug!(error = %err, "failed to read response body");
                break;
            }
        }
    }
    String::from_utf8_lossy(&excerpt).into_owned()
}

/// Lexically normalise a path: drop `.` components and redundant separators
/// and resolve `..` against preceding normal components.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }
    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}

/// Whether a status counts as a successful delivery.
#[must_use]
pub const fn is_success(status: StatusCode) -> bool {
    status.as_u16() < 400
}
