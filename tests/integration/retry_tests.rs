//! Retry wrapper integration tests

#[cfg(test)]
mod tests {
    use crate::common::fixtures::fast_retry;
    use community_hub::utils::error::fetch_with_retry;
    use community_hub::{HubError, RetryTracker};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::{assert_err, assert_ok};

    /// Succeeds on the third call and reports attempt index 2
    #[tokio::test]
    async fn test_success_after_failures() {
        let tracker = RetryTracker::new();
        let calls = Arc::new(AtomicU32::new(0));
        let options = fast_retry(3).to_options();

        let result = tracker
            .fetch_with_retry(
                || {
                    let calls = calls.clone();
                    async move {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        if n < 2 {
                            Err(HubError::timeout(format!("attempt {}", n)))
                        } else {
                            Ok("done")
                        }
                    }
                },
                &options,
            )
            .await;

        assert_eq!(assert_ok!(result), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.attempt_count(), 2);
        assert!(!tracker.is_retrying());
    }

    /// Exhaustion returns the last error after max_retries + 1 calls
    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let options = fast_retry(2).to_options();

        let result: Result<(), HubError> = fetch_with_retry(
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(HubError::remote(503, format!("failure {}", n)))
                }
            },
            &options,
        )
        .await;

        let err = assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(err.to_string().contains("failure 2"));
    }

    /// Non-transient errors stop the loop immediately
    #[tokio::test]
    async fn test_retry_if_stops_on_permanent_error() {
        let tracker = RetryTracker::new();
        let calls = Arc::new(AtomicU32::new(0));
        let options = fast_retry(5).to_options();

        let result: Result<(), HubError> = tracker
            .fetch_with_retry_if(
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(HubError::remote(404, "gone"))
                    }
                },
                &options,
                HubError::is_transient,
            )
            .await;

        assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.attempt_count(), 0);
    }

    /// A shared tracker shows the retry in progress
    #[tokio::test]
    async fn test_tracker_observed_while_retrying() {
        let tracker = RetryTracker::new();
        let observer = tracker.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let mut options = fast_retry(1).to_options();
        options.initial_delay = std::time::Duration::from_millis(200);
        options.max_delay = std::time::Duration::from_millis(200);

        let task = tokio::spawn({
            let calls = calls.clone();
            async move {
                tracker
                    .fetch_with_retry(
                        || {
                            let calls = calls.clone();
                            async move {
                                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                                    Err(HubError::timeout("first"))
                                } else {
                                    Ok(())
                                }
                            }
                        },
                        &options,
                    )
                    .await
            }
        });

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(observer.is_retrying());
        assert_eq!(observer.attempt_count(), 0);

        assert_ok!(task.await.unwrap());
        assert!(!observer.is_retrying());
        assert_eq!(observer.attempt_count(), 1);
    }

    /// Each call starts counting from zero
    #[tokio::test]
    async fn test_tracker_resets_between_calls() {
        let tracker = RetryTracker::new();
        let options = fast_retry(3).to_options();
        let calls = Arc::new(AtomicU32::new(0));

        let _ = tracker
            .fetch_with_retry(
                || {
                    let calls = calls.clone();
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(HubError::timeout("once"))
                        } else {
                            Ok(())
                        }
                    }
                },
                &options,
            )
            .await;
        assert_eq!(tracker.attempt_count(), 1);

        let result: Result<u8, HubError> =
            tracker.fetch_with_retry(|| async { Ok(7) }, &options).await;
        assert_eq!(assert_ok!(result), 7);
        assert_eq!(tracker.attempt_count(), 0);
    }
}
