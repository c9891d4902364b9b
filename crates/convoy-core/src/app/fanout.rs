//! FanOut - all-or-nothing の並列実行
//!
//! # フロー
//! 1. 入力ごとに 1 member を spawn（全員が同じ CancellationDomain に属する）
//! 2. 完了順に結果を回収
//! 3. 最初の失敗で domain を cancel → 残りの member を止めて待つ → 集約 Failure
//! 4. 全員成功なら入力順に並べた集約 Success
//!
//! Partial successes collected before a failure are dropped, never returned.
//! A worker panic (or a worker that ends on `Loading`) is an orchestration
//! fault and yields the unrecognized failure.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::cancel::CancellationDomain;
use super::task::Task;
use crate::config::FanOutConfig;
use crate::domain::{CANCELLED_CODE, ConvoyError, ResultEnvelope, TIMEOUT_CODE};

/// How one member ended.
enum MemberOutcome<T> {
    Finished(ResultEnvelope<T>),
    Cancelled,
}

/// Why collection stopped.
enum Verdict {
    Complete,
    Failed { index: usize, code: i32 },
    TimedOut,
    Cancelled,
    Fault(String),
}

#[derive(Debug, Clone, Default)]
pub struct FanOut {
    config: FanOutConfig,
}

impl FanOut {
    pub fn new(config: FanOutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FanOutConfig {
        &self.config
    }

    /// Run `worker` once per input, concurrently, as one transaction.
    pub async fn run_all<Req, Resp, F, Fut>(
        &self,
        inputs: impl IntoIterator<Item = Req>,
        worker: F,
    ) -> ResultEnvelope<Vec<Resp>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResultEnvelope<Resp>> + Send + 'static,
    {
        self.run_all_in(CancellationDomain::new(), inputs, worker).await
    }

    /// Like [`FanOut::run_all`], under a domain the caller can cancel.
    pub async fn run_all_in<Req, Resp, F, Fut>(
        &self,
        domain: CancellationDomain,
        inputs: impl IntoIterator<Item = Req>,
        worker: F,
    ) -> ResultEnvelope<Vec<Resp>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResultEnvelope<Resp>> + Send + 'static,
    {
        let worker = Arc::new(worker);
        let members = inputs
            .into_iter()
            .map(|req| {
                let worker = Arc::clone(&worker);
                // worker の呼び出し自体も spawn 先で行う（同期 panic も捕捉するため）
                async move { worker(req).await }.boxed()
            })
            .collect();
        self.drive(domain, members).await
    }

    /// Fan out pre-built Tasks. Each one joins the group's domain first.
    pub async fn run_tasks<Req, Resp>(
        &self,
        calls: Vec<(Task<Req, Resp>, Req)>,
    ) -> ResultEnvelope<Vec<Resp>>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
    {
        let domain = CancellationDomain::new();
        let members = calls
            .into_iter()
            .map(|(mut task, req)| {
                task.adopt(&domain);
                async move {
                    let mut task = task;
                    task.run(req).await
                }
                .boxed()
            })
            .collect();
        self.drive(domain, members).await
    }

    async fn drive<Resp>(
        &self,
        domain: CancellationDomain,
        members: Vec<BoxFuture<'static, ResultEnvelope<Resp>>>,
    ) -> ResultEnvelope<Vec<Resp>>
    where
        Resp: Send + 'static,
    {
        let group_id = domain.id();
        let total = members.len();

        if domain.is_cancelled() {
            return ConvoyError::FanOut { code: CANCELLED_CODE }.into();
        }

        tracing::debug!(%group_id, members = total, "fan-out started");

        let limiter = self
            .config
            .max_in_flight
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        let mut set = JoinSet::new();
        for (index, member) in members.into_iter().enumerate() {
            let token = domain.member_token();
            let limiter = limiter.clone();
            set.spawn(async move {
                let _permit = match &limiter {
                    Some(semaphore) => tokio::select! {
                        biased;
                        _ = token.cancelled() => return (index, MemberOutcome::Cancelled),
                        permit = Arc::clone(semaphore).acquire_owned() => permit.ok(),
                    },
                    None => None,
                };
                tokio::select! {
                    biased;
                    _ = token.cancelled() => (index, MemberOutcome::Cancelled),
                    envelope = member => (index, MemberOutcome::Finished(envelope)),
                }
            });
        }

        let deadline = self
            .config
            .timeout()
            .map(|after| tokio::time::Instant::now() + after);
        let mut slots: Vec<Option<Resp>> = std::iter::repeat_with(|| None).take(total).collect();

        let verdict = loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, set.join_next()).await {
                    Ok(next) => next,
                    Err(_elapsed) => break Verdict::TimedOut,
                },
                None => set.join_next().await,
            };
            let Some(joined) = next else {
                break Verdict::Complete;
            };

            match joined {
                Ok((index, MemberOutcome::Finished(ResultEnvelope::Success { payload, .. }))) => {
                    slots[index] = Some(payload);
                }
                Ok((index, MemberOutcome::Finished(ResultEnvelope::Failure { code, .. }))) => {
                    break Verdict::Failed { index, code };
                }
                Ok((index, MemberOutcome::Finished(ResultEnvelope::Loading))) => {
                    break Verdict::Fault(format!("member {index} finished while still loading"));
                }
                // member は domain 経由でしか cancel されない = 外部からの cancel
                Ok((_, MemberOutcome::Cancelled)) => break Verdict::Cancelled,
                Err(err) if err.is_panic() => {
                    break Verdict::Fault(format!("member panicked: {err}"));
                }
                Err(err) => break Verdict::Fault(err.to_string()),
            }
        };

        if !matches!(verdict, Verdict::Complete) {
            domain.cancel();
            // 残りの member が止まるまで待つ（タスクを漏らさない）
            set.shutdown().await;
        }

        match verdict {
            Verdict::Complete => match slots.into_iter().collect::<Option<Vec<Resp>>>() {
                Some(payloads) => {
                    tracing::debug!(%group_id, members = total, "fan-out succeeded");
                    ResultEnvelope::success(payloads)
                }
                None => {
                    tracing::error!(%group_id, "fan-out finished with missing member results");
                    ResultEnvelope::unrecognized()
                }
            },
            Verdict::Failed { index, code } => {
                let discarded = slots.iter().filter(|slot| slot.is_some()).count();
                tracing::warn!(
                    %group_id,
                    member = index,
                    code,
                    discarded,
                    "fan-out member failed, siblings cancelled"
                );
                ConvoyError::FanOut { code }.into()
            }
            Verdict::TimedOut => {
                tracing::warn!(%group_id, timeout = ?self.config.timeout(), "fan-out timed out");
                ConvoyError::FanOut { code: TIMEOUT_CODE }.into()
            }
            Verdict::Cancelled => {
                tracing::debug!(%group_id, "fan-out cancelled by caller");
                ConvoyError::FanOut { code: CANCELLED_CODE }.into()
            }
            Verdict::Fault(reason) => {
                tracing::error!(%group_id, %reason, "fan-out fault");
                ResultEnvelope::unrecognized()
            }
        }
    }
}
