//! Bounded concurrent recognition of a document's pages.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::ReflowConfig;
use crate::error::{BackendError, Error, Result};
use crate::model::PageImage;
use crate::recognition::backend::RecognitionBackend;
use crate::recognition::retry::{retry, RetryError, RetryPolicy};
use crate::recognition::BackendResponse;

/// Recognize every page with at most `config.max_concurrency` calls in flight.
///
/// Responses come back in the order of `pages`, whatever order the calls
/// finish in. Each attempt is bounded by `config.request_timeout` and
/// retried per `config.retry_policy()`. Every failing page is logged; the
/// first failure in page order is returned and no partial result is kept.
pub async fn fetch_pages<B>(
    backend: Arc<B>,
    pages: &[PageImage],
    config: &ReflowConfig,
) -> Result<Vec<BackendResponse>>
where
    B: RecognitionBackend + ?Sized + 'static,
{
    if pages.is_empty() {
        return Ok(Vec::new());
    }

    let permits = config.max_concurrency.min(pages.len()).max(1);
    let semaphore = Arc::new(Semaphore::new(permits));
    let policy = config.retry_policy();
    let request_timeout = config.request_timeout;

    log::info!(
        "Recognizing {} page(s) with {} at concurrency {}",
        pages.len(),
        backend.name(),
        permits
    );

    let mut handles = Vec::with_capacity(pages.len());
    for image in pages {
        let semaphore = Arc::clone(&semaphore);
        let backend = Arc::clone(&backend);
        let image = image.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| Error::WorkerFailed {
                    page: image.page_number,
                })?;
            recognize_page(backend.as_ref(), &image, &policy, request_timeout).await
        }));
    }

    let mut responses = Vec::with_capacity(pages.len());
    let mut first_error: Option<Error> = None;

    for (image, handle) in pages.iter().zip(handles) {
        let outcome = handle.await.unwrap_or_else(|join_err| {
            log::error!("Worker for page {} aborted: {}", image.page_number, join_err);
            Err(Error::WorkerFailed {
                page: image.page_number,
            })
        });
        match outcome {
            Ok(response) => responses.push(response),
            Err(err) => {
                log::error!("{}", err);
                first_error.get_or_insert(err);
            },
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(responses),
    }
}

async fn recognize_page<B>(
    backend: &B,
    image: &PageImage,
    policy: &RetryPolicy,
    request_timeout: Duration,
) -> Result<BackendResponse>
where
    B: RecognitionBackend + ?Sized,
{
    let page = image.page_number;
    let result = retry(policy, || async {
        match tokio::time::timeout(request_timeout, backend.recognize(image)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Transient(format!(
                "no response within {:?}",
                request_timeout
            ))),
        }
    })
    .await;

    match result {
        Ok(response) => {
            log::debug!("Page {}: {} word(s) recognized", page, response.word_count());
            Ok(response)
        },
        Err(RetryError::Fatal(BackendError::Timeout(waited))) => {
            Err(Error::OperationTimeout { page, waited })
        },
        Err(RetryError::Fatal(source)) => Err(Error::Recognition { page, source }),
        Err(RetryError::Exhausted { attempts, last }) => Err(Error::RetriesExhausted {
            page,
            attempts,
            source: last,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replies with a canned result per page, sleeping `delay_ms / page`.
    struct Scripted {
        failures: Mutex<HashMap<u32, Vec<BackendError>>>,
        delay_ms: u64,
    }

    impl Scripted {
        fn new(delay_ms: u64) -> Self {
            Self {
                failures: Mutex::new(HashMap::new()),
                delay_ms,
            }
        }

        fn fail(self, page: u32, errors: Vec<BackendError>) -> Self {
            self.failures.lock().unwrap().insert(page, errors);
            self
        }
    }

    #[async_trait]
    impl RecognitionBackend for Scripted {
        async fn recognize(
            &self,
            image: &PageImage,
        ) -> std::result::Result<BackendResponse, BackendError> {
            let page = image.page_number;
            tokio::time::sleep(Duration::from_millis(self.delay_ms / u64::from(page))).await;
            let next = self
                .failures
                .lock()
                .unwrap()
                .get_mut(&page)
                .and_then(|errors| (!errors.is_empty()).then(|| errors.remove(0)));
            match next {
                Some(err) => Err(err),
                None => Ok(BackendResponse::Words {
                    words: vec![crate::recognition::BackendWord {
                        text: format!("p{}", page),
                        bounding_box: crate::geometry::BoundingBox::new(0.0, 0.0, 10.0, 10.0),
                        break_type: None,
                    }],
                }),
            }
        }
    }

    fn pages(n: u32) -> Vec<PageImage> {
        (1..=n).map(|i| PageImage::new(i, format!("p{}.png", i))).collect()
    }

    fn first_text(response: &BackendResponse) -> &str {
        match response {
            BackendResponse::Words { words } => &words[0].text,
            BackendResponse::Blocks { .. } => unreachable!(),
        }
    }

    fn config() -> ReflowConfig {
        ReflowConfig::default()
            .with_max_concurrency(3)
            .with_backoff_factor(0.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_page_order() {
        let backend = Arc::new(Scripted::new(1000));
        let responses = fetch_pages(backend, &pages(5), &config()).await.unwrap();
        let texts: Vec<&str> = responses.iter().map(first_text).collect();
        assert_eq!(texts, vec!["p1", "p2", "p3", "p4", "p5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let backend = Arc::new(
            Scripted::new(10).fail(2, vec![BackendError::Transient("reset".into())]),
        );
        let responses = fetch_pages(backend, &pages(3), &config()).await.unwrap();
        assert_eq!(first_text(&responses[1]), "p2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_fails_document() {
        let backend =
            Arc::new(Scripted::new(10).fail(2, vec![BackendError::Terminal("bad image".into())]));
        let err = fetch_pages(backend, &pages(3), &config()).await.unwrap_err();
        assert!(matches!(err, Error::Recognition { page: 2, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_failure_in_page_order_wins() {
        let backend = Arc::new(
            Scripted::new(1000)
                .fail(3, vec![BackendError::Terminal("three".into())])
                .fail(4, vec![BackendError::Terminal("four".into())]),
        );
        let err = fetch_pages(backend, &pages(4), &config()).await.unwrap_err();
        assert!(matches!(err, Error::Recognition { page: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input() {
        let backend = Arc::new(Scripted::new(10));
        assert!(fetch_pages(backend, &[], &config()).await.unwrap().is_empty());
    }
}
