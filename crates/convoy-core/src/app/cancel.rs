//! CancellationDomain - fan-out 1 回分の共有キャンセル信号
//!
//! One domain per fan-out call. Every member task gets its own child token,
//! so cancelling the domain reaches all members while a member cancelling
//! itself (e.g. its own timeout) leaves siblings alone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::domain::GroupId;

struct DomainInner {
    id: GroupId,
    token: CancellationToken,
    cancelled: AtomicBool,
}

/// Shared cancellation signal of one orchestration group.
///
/// Cloning is cheap and every clone refers to the same domain.
#[derive(Clone)]
pub struct CancellationDomain {
    inner: Arc<DomainInner>,
}

impl CancellationDomain {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DomainInner {
                id: GroupId::generate(),
                token: CancellationToken::new(),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> GroupId {
        self.inner.id
    }

    /// Cancel every member that has not completed.
    ///
    /// Idempotent and non-blocking. Returns `true` only for the call that
    /// actually flipped the domain.
    pub fn cancel(&self) -> bool {
        let first = self
            .inner
            .cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            tracing::debug!(group_id = %self.inner.id, "cancellation domain cancelled");
        }
        self.inner.token.cancel();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Resolves once the domain is cancelled.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }

    /// A fresh token for one member. Cancelled with the domain, but can be
    /// cancelled on its own without touching siblings.
    pub fn member_token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }
}

impl Default for CancellationDomain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationDomain")
            .field("id", &self.inner.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Reference to a Task's token.
///
/// The Task owns its token; whoever holds this handle can only ask it to stop.
#[derive(Debug, Clone)]
pub struct TaskCancelHandle {
    token: CancellationToken,
}

impl TaskCancelHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancel_is_idempotent() {
        let domain = CancellationDomain::new();
        assert!(!domain.is_cancelled());

        assert!(domain.cancel());
        assert!(!domain.cancel());
        assert!(domain.is_cancelled());
    }

    #[test]
    fn cancel_reaches_every_member() {
        let domain = CancellationDomain::new();
        let members: Vec<_> = (0..4).map(|_| domain.member_token()).collect();

        domain.cancel();
        assert!(members.iter().all(|m| m.is_cancelled()));
    }

    #[test]
    fn member_cancel_does_not_touch_siblings() {
        let domain = CancellationDomain::new();
        let a = domain.member_token();
        let b = domain.member_token();

        a.cancel();
        assert!(a.is_cancelled());
        assert!(!b.is_cancelled());
        assert!(!domain.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let domain = CancellationDomain::new();
        let other = domain.clone();
        other.cancel();
        assert!(domain.is_cancelled());
        assert_eq!(domain.id(), other.id());
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters() {
        let domain = CancellationDomain::new();
        let waiter = {
            let domain = domain.clone();
            tokio::spawn(async move { domain.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        domain.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[test]
    fn handle_cancels_the_token() {
        let token = CancellationToken::new();
        let handle = TaskCancelHandle::new(token.clone());
        handle.cancel();
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(handle.is_cancelled());
    }
}
