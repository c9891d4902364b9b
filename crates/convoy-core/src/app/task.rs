//! Task - 1 回分の非同期リクエスト
//!
//! A Task wraps one call into the network collaborator and turns whatever
//! comes back into a [`ResultEnvelope`]. Transport errors, non-success
//! statuses and empty payloads all become failures; nothing raw escapes.
//!
//! Each Task owns its cancellation token. Other parties (the fan-out
//! orchestrator, a presenter) only get a [`TaskCancelHandle`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::cancel::{CancellationDomain, TaskCancelHandle};
use crate::domain::{ConvoyError, Pagination, ResultEnvelope, TaskId, TaskState, TransportError};
use crate::ports::RawResponse;

type CallFn<Req, Resp> =
    dyn Fn(Req) -> BoxFuture<'static, Result<RawResponse<Resp>, TransportError>> + Send + Sync;

pub struct Task<Req, Resp> {
    id: TaskId,
    state: TaskState,
    token: CancellationToken,
    /// Member token of the fan-out domain this task joined, if any.
    group: Option<CancellationToken>,
    call: Arc<CallFn<Req, Resp>>,
}

impl<Req, Resp> Task<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Build a Task around one collaborator call.
    pub fn new<F, Fut>(call: F) -> Self
    where
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RawResponse<Resp>, TransportError>> + Send + 'static,
    {
        Self {
            id: TaskId::generate(),
            state: TaskState::Idle,
            token: CancellationToken::new(),
            group: None,
            call: Arc::new(move |req| call(req).boxed()),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn cancel_handle(&self) -> TaskCancelHandle {
        TaskCancelHandle::new(self.token.clone())
    }

    /// Join a fan-out domain. The task keeps its own token (existing handles
    /// still work) and additionally stops when the domain is cancelled.
    pub(crate) fn adopt(&mut self, domain: &CancellationDomain) {
        self.group = Some(domain.member_token());
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.group.as_ref().is_some_and(|g| g.is_cancelled())
    }

    /// Run the call and normalize the outcome into an envelope.
    pub async fn run(&mut self, input: Req) -> ResultEnvelope<Resp> {
        match self.execute(input).await {
            Ok((payload, pagination)) => {
                ResultEnvelope::success_paged(payload, pagination.unwrap_or_default())
            }
            Err(err) => err.into(),
        }
    }

    /// Same call, but as `Result` and with an optional deadline.
    ///
    /// On timeout the task's own token is cancelled (siblings sharing a
    /// domain are not affected) and `ConvoyError::Timeout` is returned.
    pub async fn run_with_timeout(
        &mut self,
        input: Req,
        timeout: Option<Duration>,
    ) -> Result<Resp, ConvoyError> {
        let Some(after) = timeout else {
            return self.execute(input).await.map(|(payload, _)| payload);
        };

        let outcome = tokio::time::timeout(after, self.execute(input)).await;
        match outcome {
            Ok(result) => result.map(|(payload, _)| payload),
            Err(_elapsed) => {
                self.token.cancel();
                self.state = TaskState::Cancelled;
                tracing::debug!(task_id = %self.id, ?after, "task timed out");
                Err(ConvoyError::Timeout { after })
            }
        }
    }

    async fn execute(&mut self, input: Req) -> Result<(Resp, Option<Pagination>), ConvoyError> {
        // 1 Task = 1 回。終了状態からは再実行しない
        if self.state.is_terminal() {
            tracing::debug!(task_id = %self.id, state = ?self.state, "task already completed");
            return Err(ConvoyError::Fault(format!(
                "task already completed ({:?})",
                self.state
            )));
        }
        if self.is_cancelled() {
            self.state = TaskState::Cancelled;
            return Err(ConvoyError::Cancelled);
        }

        self.state = TaskState::Running;
        let token = self.token.clone();
        let group = self.group.clone();
        let cancelled = async move {
            match group {
                Some(group) => tokio::select! {
                    _ = token.cancelled() => {}
                    _ = group.cancelled() => {}
                },
                None => token.cancelled().await,
            }
        };
        let call = (self.call)(input);

        let raw = tokio::select! {
            biased;
            _ = cancelled => Err(ConvoyError::Cancelled),
            raw = call => raw.map_err(ConvoyError::from),
        };

        let result = raw.and_then(normalize);
        self.state = match &result {
            Ok(_) => TaskState::Succeeded,
            Err(ConvoyError::Cancelled) => TaskState::Cancelled,
            Err(_) => TaskState::Failed,
        };
        if let Err(err) = &result {
            tracing::debug!(task_id = %self.id, code = err.code(), error = %err, "task failed");
        }
        result
    }
}

impl<Req, Resp> std::fmt::Debug for Task<Req, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Raw response -> payload, or the matching error.
fn normalize<T>(raw: RawResponse<T>) -> Result<(T, Option<Pagination>), ConvoyError> {
    if !raw.is_success() {
        return Err(ConvoyError::status(raw.status, raw.message));
    }
    match raw.payload {
        Some(payload) => Ok((payload, raw.pagination)),
        None => Err(ConvoyError::EmptyPayload { code: raw.status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransportError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo() -> Task<u32, u32> {
        Task::new(|n: u32| async move { Ok(RawResponse::ok(n)) })
    }

    fn slow(delay: Duration) -> Task<u32, u32> {
        Task::new(move |n: u32| async move {
            tokio::time::sleep(delay).await;
            Ok(RawResponse::ok(n))
        })
    }

    #[tokio::test]
    async fn success_without_pagination() {
        let mut task = echo();
        assert_eq!(task.state(), TaskState::Idle);

        let env = task.run(7).await;
        assert_eq!(env, ResultEnvelope::success(7));
        assert_eq!(task.state(), TaskState::Succeeded);
    }

    #[tokio::test]
    async fn success_keeps_pagination() {
        let mut task = Task::new(|_: ()| async {
            Ok(RawResponse::ok(vec![1, 2]).with_pagination(Pagination::new(1, 2, 4, 2)))
        });

        let env = task.run(()).await;
        assert_eq!(env.pagination(), Some(Pagination::new(1, 2, 4, 2)));
    }

    #[tokio::test]
    async fn transport_error_becomes_failure_with_its_code() {
        let mut task: Task<(), u32> =
            Task::new(|_| async { Err(TransportError::Unreachable("no route".into())) });

        let env = task.run(()).await;
        assert_eq!(env.failure_code(), Some(1001));
        assert_eq!(task.state(), TaskState::Failed);
    }

    #[tokio::test]
    async fn uncoded_transport_error_is_unrecognized() {
        let mut task: Task<(), u32> =
            Task::new(|_| async { Err(TransportError::Other("tls".into())) });

        assert_eq!(task.run(()).await.failure_code(), Some(-1));
    }

    #[tokio::test]
    async fn error_status_prefers_server_message() {
        let mut task: Task<(), u32> =
            Task::new(|_| async { Ok(RawResponse::error(500, Some("db down".into()))) });
        let env = task.run(()).await;
        assert_eq!(env.failure_code(), Some(500));
        assert_eq!(env.failure_message(), Some("db down"));

        let mut task: Task<(), u32> = Task::new(|_| async { Ok(RawResponse::error(404, None)) });
        let env = task.run(()).await;
        assert_eq!(env.failure_message(), Some("requested resource was not found"));
    }

    #[tokio::test]
    async fn empty_payload_on_success_status_is_a_failure() {
        let mut task: Task<(), u32> = Task::new(|_| async { Ok(RawResponse::error(200, None)) });

        let env = task.run(()).await;
        assert_eq!(env.failure_code(), Some(200));
        assert_eq!(env.failure_message(), Some("response payload was empty"));
        assert_eq!(task.state(), TaskState::Failed);
    }

    #[tokio::test]
    async fn finished_task_does_not_call_again() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut task = {
            let calls = Arc::clone(&calls);
            Task::new(move |n: u32| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(RawResponse::ok(n)) }
            })
        };

        assert_eq!(task.run(1).await, ResultEnvelope::success(1));
        assert_eq!(task.state(), TaskState::Succeeded);

        let again = task.run(2).await;
        assert_eq!(again, ResultEnvelope::unrecognized());
        assert!(matches!(task.run_with_timeout(3, None).await, Err(ConvoyError::Fault(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(task.state(), TaskState::Succeeded);
    }

    #[tokio::test]
    async fn failed_task_stays_failed() {
        let mut task: Task<(), u32> = Task::new(|_| async { Ok(RawResponse::error(503, None)) });
        assert_eq!(task.run(()).await.failure_code(), Some(503));
        assert_eq!(task.run(()).await.failure_code(), Some(-1));
        assert_eq!(task.state(), TaskState::Failed);
    }

    #[tokio::test]
    async fn cancelled_before_run() {
        let mut task = echo();
        task.cancel_handle().cancel();

        let env = task.run(1).await;
        assert_eq!(env.failure_code(), Some(1003));
        assert_eq!(task.state(), TaskState::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_while_running() {
        let mut task = slow(Duration::from_secs(5));
        let handle = task.cancel_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });

        let env = tokio::time::timeout(Duration::from_secs(1), task.run(1))
            .await
            .expect("cancel should end the run");
        assert_eq!(env.failure_code(), Some(1003));
    }

    #[tokio::test]
    async fn run_with_timeout_passes_through() {
        let mut task = slow(Duration::from_millis(5));
        let value = task.run_with_timeout(3, Some(Duration::from_secs(1))).await;
        assert_eq!(value, Ok(3));

        let mut task = echo();
        assert_eq!(task.run_with_timeout(4, None).await, Ok(4));
    }

    #[tokio::test]
    async fn run_with_timeout_cancels_the_task() {
        let mut task = slow(Duration::from_secs(1));
        let handle = task.cancel_handle();

        let err = task
            .run_with_timeout(1, Some(Duration::from_millis(10)))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvoyError::Timeout { .. }));
        assert!(handle.is_cancelled());
        assert_eq!(task.state(), TaskState::Cancelled);
    }

    #[tokio::test]
    async fn adopted_task_follows_domain() {
        let domain = CancellationDomain::new();
        let mut task = slow(Duration::from_secs(5));
        task.adopt(&domain);
        domain.cancel();

        assert_eq!(task.run(1).await.failure_code(), Some(1003));
    }

    #[tokio::test]
    async fn adopted_task_keeps_its_own_handle() {
        let domain = CancellationDomain::new();
        let mut task = echo();
        let handle = task.cancel_handle();
        task.adopt(&domain);
        handle.cancel();

        assert_eq!(task.run(1).await.failure_code(), Some(1003));
        assert!(!domain.is_cancelled());
    }
}
