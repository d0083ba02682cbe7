//! Dispatcher behaviour driven through a scripted change source.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use ferry_app::{AppError, ChangeSource, Notification, WatchError, run_app_with};
use ferry_config::{AgentConfig, OverflowPolicy, UploadLimits};
use ferry_events::{Event, EventBus, EventStream};
use httpmock::MockServer;
use httpmock::prelude::*;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(10);

#[derive(Clone, Default)]
struct ScriptedSource {
    registered: Arc<Mutex<Vec<PathBuf>>>,
    reject: Option<PathBuf>,
}

impl ChangeSource for ScriptedSource {
    fn register(&mut self, dir: &Path) -> Result<(), WatchError> {
        if self.reject.as_deref() == Some(dir) {
            return Err(WatchError::Register {
                path: dir.to_path_buf(),
                source: notify::Error::path_not_found(),
            });
        }
        self.registered
            .lock()
            .map_err(|_| WatchError::Register {
                path: dir.to_path_buf(),
                source: notify::Error::generic("poisoned"),
            })?
            .push(dir.to_path_buf());
        Ok(())
    }
}

struct Harness {
    events: EventStream,
    notifications: mpsc::Sender<Notification>,
    agent: JoinHandle<Result<(), AppError>>,
}

fn start(config: AgentConfig, source: ScriptedSource) -> Harness {
    let bus = EventBus::new();
    let events = bus.subscribe();
    let (notifications, rx) = mpsc::channel(16);
    let agent = tokio::spawn(run_app_with(Arc::new(config), bus, source, rx));
    Harness {
        events,
        notifications,
        agent,
    }
}

async fn wait_for(stream: &mut EventStream, kind: &str, count: usize) -> Result<Vec<Event>> {
    tokio::time::timeout(WAIT, async {
        let mut seen = Vec::new();
        while seen.len() < count {
            match stream.next().await {
                Some(envelope) if envelope.event.kind() == kind => seen.push(envelope.event),
                Some(_) => {}
                None => break,
            }
        }
        seen
    })
    .await
    .map_err(|_| anyhow!("timed out waiting for {count} {kind} event(s)"))
}

fn config(server: &MockServer, dir: &Path) -> ferry_config::AgentConfigBuilder {
    AgentConfig::builder(format!("{}/upload", server.base_url()))
        .include("*.csv")
        .watch_dir(dir)
}

#[tokio::test]
async fn initial_scan_uploads_matching_files_only() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200);
    });
    let temp = tempfile::tempdir()?;
    fs::write(temp.path().join("report.csv"), b"a,b\n")?;
    fs::write(temp.path().join(".hidden.csv"), b"x")?;
    fs::write(temp.path().join("notes.txt"), b"n")?;
    fs::create_dir(temp.path().join("archive.csv"))?;

    let source = ScriptedSource::default();
    let registered = Arc::clone(&source.registered);
    let mut harness = start(config(&server, temp.path()).build()?, source);

    wait_for(&mut harness.events, "scan_completed", 1).await?;

    assert!(!temp.path().join("report.csv").exists());
    assert!(temp.path().join(".hidden.csv").exists());
    assert!(temp.path().join("notes.txt").exists());
    assert!(temp.path().join("archive.csv").is_dir());
    assert_eq!(mock.hits(), 1);
    assert_eq!(
        registered.lock().map_err(|_| anyhow!("poisoned"))?.clone(),
        vec![temp.path().to_path_buf()]
    );

    drop(harness.notifications);
    let result = harness.agent.await?;
    assert!(matches!(result, Err(AppError::NotificationsClosed)));
    Ok(())
}

#[tokio::test]
async fn live_notifications_skip_hidden_files() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200);
    });
    let temp = tempfile::tempdir()?;
    let hidden = temp.path().join(".hidden.csv");
    let report = temp.path().join("report.csv");
    fs::write(&hidden, b"secret")?;
    fs::write(&report, b"a,b\n")?;

    let mut harness = start(
        config(&server, temp.path()).initial_scan(false).build()?,
        ScriptedSource::default(),
    );
    harness
        .notifications
        .send(Notification::Changed(hidden.clone()))
        .await?;
    harness
        .notifications
        .send(Notification::Changed(report.clone()))
        .await?;

    let removed = wait_for(&mut harness.events, "file_removed", 1).await?;
    assert_eq!(removed.len(), 1);
    assert!(!report.exists());
    assert!(hidden.exists());
    assert_eq!(mock.hits(), 1);
    harness.agent.abort();
    Ok(())
}

#[tokio::test]
async fn subscription_failure_is_fatal() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200);
    });
    let temp = tempfile::tempdir()?;
    let report = temp.path().join("report.csv");
    fs::write(&report, b"a,b\n")?;

    let harness = start(
        config(&server, temp.path()).initial_scan(false).build()?,
        ScriptedSource::default(),
    );
    harness
        .notifications
        .send(Notification::Failed(WatchError::Subscription {
            source: notify::Error::generic("queue overflow"),
        }))
        .await?;
    harness
        .notifications
        .send(Notification::Changed(report.clone()))
        .await?;

    let result = tokio::time::timeout(WAIT, harness.agent).await??;
    assert!(matches!(
        result,
        Err(AppError::Watch {
            operation: "subscription",
            ..
        })
    ));
    assert!(report.exists());
    assert_eq!(mock.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn registration_failure_aborts_before_any_work() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200);
    });
    let first = tempfile::tempdir()?;
    let second = tempfile::tempdir()?;
    fs::write(first.path().join("report.csv"), b"a,b\n")?;

    let source = ScriptedSource {
        reject: Some(second.path().to_path_buf()),
        ..ScriptedSource::default()
    };
    let harness = start(
        config(&server, first.path())
            .watch_dir(second.path())
            .build()?,
        source,
    );

    let result = tokio::time::timeout(WAIT, harness.agent).await??;
    assert!(matches!(
        result,
        Err(AppError::Watch {
            operation: "register",
            ..
        })
    ));
    assert!(first.path().join("report.csv").exists());
    assert_eq!(mock.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn unreadable_scan_directory_is_fatal() -> Result<()> {
    let server = MockServer::start_async().await;
    let temp = tempfile::tempdir()?;
    let missing = temp.path().join("missing");

    let harness = start(config(&server, &missing).build()?, ScriptedSource::default());

    let result = tokio::time::timeout(WAIT, harness.agent).await??;
    assert!(matches!(result, Err(AppError::FsOps { .. })));
    drop(harness.notifications);
    Ok(())
}

#[tokio::test]
async fn saturated_limiter_drops_notifications_under_reject() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200).delay(Duration::from_millis(500));
    });
    let temp = tempfile::tempdir()?;
    let first = temp.path().join("a.csv");
    let second = temp.path().join("b.csv");
    fs::write(&first, b"1\n")?;
    fs::write(&second, b"2\n")?;

    let limits = UploadLimits {
        max_in_flight: NonZeroUsize::new(1),
        overflow: OverflowPolicy::Reject,
    };
    let mut harness = start(
        config(&server, temp.path())
            .initial_scan(false)
            .limits(limits)
            .build()?,
        ScriptedSource::default(),
    );
    harness
        .notifications
        .send(Notification::Changed(first.clone()))
        .await?;
    harness
        .notifications
        .send(Notification::Changed(second.clone()))
        .await?;

    let dropped = wait_for(&mut harness.events, "notification_dropped", 1).await?;
    assert_eq!(
        dropped,
        vec![Event::NotificationDropped {
            path: second.display().to_string(),
        }]
    );
    wait_for(&mut harness.events, "file_removed", 1).await?;
    assert!(!first.exists());
    assert!(second.exists());
    assert_eq!(mock.hits(), 1);
    harness.agent.abort();
    Ok(())
}

#[tokio::test]
async fn repeated_notifications_for_one_path_upload_independently() -> Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST).path("/upload");
        then.status(200);
    });
    let temp = tempfile::tempdir()?;
    let report = temp.path().join("report.csv");
    fs::write(&report, b"a,b\n")?;

    let mut harness = start(
        config(&server, temp.path())
            .initial_scan(false)
            .keep_files(true)
            .build()?,
        ScriptedSource::default(),
    );
    for _ in 0..2 {
        harness
            .notifications
            .send(Notification::Changed(report.clone()))
            .await?;
    }

    let delivered = wait_for(&mut harness.events, "upload_delivered", 2).await?;
    assert_eq!(delivered.len(), 2);
    let task_ids: Vec<_> = delivered.iter().filter_map(Event::task_id).collect();
    assert_eq!(task_ids.len(), 2);
    assert_ne!(task_ids[0], task_ids[1]);
    assert!(report.exists());
    assert_eq!(mock.hits(), 2);
    harness.agent.abort();
    Ok(())
}
