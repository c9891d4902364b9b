//! SequentialExecutor - 単発リクエストの実行
//!
//! No cancellation domain: one call, one caller. With a timeout the
//! in-flight future is dropped on overrun, so nothing keeps running behind
//! the caller's back.

use std::future::Future;
use std::time::Duration;

use super::task::Task;
use crate::config::ExecutorConfig;
use crate::domain::ConvoyError;

#[derive(Debug, Clone, Default)]
pub struct SequentialExecutor {
    config: ExecutorConfig,
}

impl SequentialExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Per-call timeout wins over the configured one.
    fn resolve_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        timeout.or_else(|| self.config.timeout())
    }

    /// Run `worker(input)`, optionally bounded by a timeout.
    pub async fn execute<Req, Resp, F, Fut>(
        &self,
        input: Req,
        worker: F,
        timeout: Option<Duration>,
    ) -> Result<Resp, ConvoyError>
    where
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Resp>,
    {
        match self.resolve_timeout(timeout) {
            None => Ok(worker(input).await),
            Some(after) => tokio::time::timeout(after, worker(input))
                .await
                .map_err(|_elapsed| {
                    tracing::debug!(?after, "sequential call timed out");
                    ConvoyError::Timeout { after }
                }),
        }
    }

    /// Run a [`Task`] through its `Result` variant with the same timeout rules.
    pub async fn execute_task<Req, Resp>(
        &self,
        task: &mut Task<Req, Resp>,
        input: Req,
        timeout: Option<Duration>,
    ) -> Result<Resp, ConvoyError>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        task.run_with_timeout(input, self.resolve_timeout(timeout)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskState;
    use crate::ports::RawResponse;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn passes_through_without_timeout() {
        let executor = SequentialExecutor::default();
        let value = executor.execute(21, |n| async move { n * 2 }, None).await;
        assert_eq!(value, Ok(42));
    }

    #[tokio::test]
    async fn timeout_fails_and_drops_the_worker() {
        let executor = SequentialExecutor::default();
        let dropped = Arc::new(AtomicBool::new(false));

        let result = {
            let dropped = Arc::clone(&dropped);
            executor
                .execute(
                    1,
                    move |n: u32| async move {
                        let _flag = DropFlag(dropped);
                        tokio::time::sleep(Duration::from_millis(1000)).await;
                        n
                    },
                    Some(Duration::from_millis(10)),
                )
                .await
        };

        assert_eq!(
            result,
            Err(ConvoyError::Timeout {
                after: Duration::from_millis(10)
            })
        );
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn configured_timeout_applies_by_default() {
        let executor =
            SequentialExecutor::new(ExecutorConfig::default().with_timeout(Duration::from_millis(10)));
        let result = executor
            .execute(
                (),
                |_| async { tokio::time::sleep(Duration::from_millis(500)).await },
                None,
            )
            .await;
        assert!(matches!(result, Err(ConvoyError::Timeout { .. })));
    }

    #[tokio::test]
    async fn per_call_timeout_overrides_config() {
        let executor =
            SequentialExecutor::new(ExecutorConfig::default().with_timeout(Duration::from_millis(5)));
        let result = executor
            .execute(
                7,
                |n| async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    n
                },
                Some(Duration::from_secs(1)),
            )
            .await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn execute_task_times_out_only_that_task() {
        let executor = SequentialExecutor::default();
        let mut slow = Task::new(|n: u32| async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(RawResponse::ok(n))
        });
        let mut fast = Task::new(|n: u32| async move { Ok(RawResponse::ok(n)) });

        let err = executor
            .execute_task(&mut slow, 1, Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvoyError::Timeout { .. }));
        assert_eq!(slow.state(), TaskState::Cancelled);

        assert_eq!(executor.execute_task(&mut fast, 2, None).await, Ok(2));
        assert_eq!(fast.state(), TaskState::Succeeded);
    }
}
