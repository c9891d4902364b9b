//! NetworkClient port - 外部のネットワーククライアント
//!
//! The core never speaks HTTP. It consumes this trait and normalizes whatever
//! comes back (see `app::task`). Implementations live outside the core;
//! `impls::InMemoryClient` is the development one.

use async_trait::async_trait;

use crate::domain::{Pagination, TransportError};

/// What the collaborator hands back for one request, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse<T> {
    pub status: i32,
    pub payload: Option<T>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

impl<T> RawResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            status: 200,
            payload: Some(payload),
            message: None,
            pagination: None,
        }
    }

    /// Error status with an optional server message.
    pub fn error(status: i32, message: Option<String>) -> Self {
        Self {
            status,
            payload: None,
            message,
            pagination: None,
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Query for a paged list. `None` leaves the choice to the collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: None,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

/// The network collaborator.
///
/// `Item` is what the remote resource returns, `Draft` is what create/update send.
#[async_trait]
pub trait NetworkClient: Send + Sync + 'static {
    type Item: Send + 'static;
    type Draft: Send + 'static;

    async fn get_list(
        &self,
        query: ListQuery,
    ) -> Result<RawResponse<Vec<Self::Item>>, TransportError>;

    async fn get_one(&self, id: u64) -> Result<RawResponse<Self::Item>, TransportError>;

    async fn create(&self, draft: Self::Draft) -> Result<RawResponse<Self::Item>, TransportError>;

    async fn update(
        &self,
        id: u64,
        draft: Self::Draft,
    ) -> Result<RawResponse<Self::Item>, TransportError>;
}
