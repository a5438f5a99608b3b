//! Backend traits and the polling adapter.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::BackendError;
use crate::model::PageImage;
use crate::recognition::BackendResponse;

/// A backend that answers a recognition call directly.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Recognize one page image.
    async fn recognize(&self, image: &PageImage) -> Result<BackendResponse, BackendError>;

    /// Return the name of this backend for logging.
    fn name(&self) -> &'static str {
        "backend"
    }
}

/// Opaque identifier of a running asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub String);

/// Status reported when polling an asynchronous operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    /// Still running
    InProgress,
    /// Finished with a result
    Succeeded(BackendResponse),
    /// Finished with an explicit failure
    Failed(String),
}

/// A backend that starts an operation and is polled for its result.
#[async_trait]
pub trait AsyncRecognitionBackend: Send + Sync {
    /// Start recognizing one page image.
    async fn start(&self, image: &PageImage) -> Result<OperationHandle, BackendError>;

    /// Check on a running operation.
    async fn poll(&self, handle: &OperationHandle) -> Result<OperationStatus, BackendError>;

    /// Return the name of this backend for logging.
    fn name(&self) -> &'static str {
        "async-backend"
    }
}

/// Adapts an [`AsyncRecognitionBackend`] into a [`RecognitionBackend`].
///
/// The operation is polled every `poll_interval` until it reaches a final
/// status or `timeout` has elapsed since it was started.
pub struct PollingBackend<B> {
    inner: B,
    poll_interval: Duration,
    timeout: Duration,
}

impl<B> PollingBackend<B> {
    /// Wrap `inner` with the given polling cadence and wait budget.
    pub fn new(inner: B, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            inner,
            poll_interval,
            timeout,
        }
    }

    /// Wrap `inner` using the polling settings of `config`.
    pub fn from_config(inner: B, config: &crate::config::ReflowConfig) -> Self {
        Self::new(inner, config.poll_interval, config.operation_timeout)
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: AsyncRecognitionBackend> RecognitionBackend for PollingBackend<B> {
    async fn recognize(&self, image: &PageImage) -> Result<BackendResponse, BackendError> {
        let handle = self.inner.start(image).await?;
        let started = Instant::now();
        log::debug!(
            "{}: started operation {:?} for page {}",
            self.inner.name(),
            handle.0,
            image.page_number
        );

        loop {
            match self.inner.poll(&handle).await? {
                OperationStatus::Succeeded(response) => return Ok(response),
                OperationStatus::Failed(message) => {
                    return Err(BackendError::OperationFailed(message));
                },
                OperationStatus::InProgress => {},
            }

            let waited = started.elapsed();
            if waited >= self.timeout {
                log::warn!(
                    "{}: operation {:?} for page {} still running after {:?}",
                    self.inner.name(),
                    handle.0,
                    image.page_number,
                    waited
                );
                return Err(BackendError::Timeout(waited));
            }
            tokio::time::sleep(self.poll_interval.min(self.timeout - waited)).await;
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
