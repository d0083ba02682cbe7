//! Admission control for upload tasks.

use std::sync::Arc;

use ferry_config::{OverflowPolicy, UploadLimits};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Optional cap on concurrently running uploads.
#[derive(Clone, Debug)]
pub struct UploadLimiter {
    permits: Option<Arc<Semaphore>>,
    overflow: OverflowPolicy,
}

/// Decision for one notification.
#[derive(Debug)]
pub enum Admission {
    /// Run now. Holds a permit when the limiter is bounded.
    Ready(Option<OwnedSemaphorePermit>),
    /// Run once a permit frees up.
    Queued(Arc<Semaphore>),
    /// Drop the notification.
    Rejected,
}

impl Admission {
    /// Wait for the permit this admission stands for.
    ///
    /// Resolves immediately for [`Admission::Ready`] and to `None` for
    /// [`Admission::Rejected`].
    pub async fn wait(self) -> Option<OwnedSemaphorePermit> {
        match self {
            Self::Ready(permit) => permit,
            Self::Queued(semaphore) => semaphore.acquire_owned().await.ok(),
            Self::Rejected => None,
        }
    }
}

impl UploadLimiter {
    /// Build a limiter from configured limits.
    #[must_use]
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            permits: limits
                .max_in_flight
                .map(|max| Arc::new(Semaphore::new(max.get()))),
            overflow: limits.overflow,
        }
    }

    /// Limiter that admits everything.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(UploadLimits::default())
    }

    /// Decide what to do with a new notification without waiting.
    #[must_use]
    pub fn admit(&self) -> Admission {
        let Some(semaphore) = &self.permits else {
            return Admission::Ready(None);
        };
        match Arc::clone(semaphore).try_acquire_owned() {
            Ok(permit) => Admission::Ready(Some(permit)),
            Err(_) => match self.overflow {
                OverflowPolicy::Wait => Admission::Queued(Arc::clone(semaphore)),
                OverflowPolicy::Reject => Admission::Rejected,
            },
        }
    }

    /// Wait for a slot regardless of the overflow policy. Used by the initial
    /// scan, which never drops entries.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.permits {
            Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
            None => None,
        }
    }

    /// Uploads that can start right now, or `None` when unbounded.
    #[must_use]
    pub fn available(&self) -> Option<usize> {
        self.permits.as_ref().map(|semaphore| semaphore.available_permits())
    }
}
