//! InMemoryClient - 開発・テスト用の NetworkClient
//!
//! Behaves like a small paged REST resource (`page`, `per_page`, `total`,
//! `total_pages`) backed by a map. Latency, per-id failures and an offline
//! switch can be injected to exercise the failure paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::{Pagination, TransportError};
use crate::ports::{ListQuery, NetworkClient, RawResponse};

const DEFAULT_PER_PAGE: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
    pub job: String,
}

/// Body of create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub name: String,
    pub job: String,
}

impl RecordDraft {
    pub fn new(name: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job: job.into(),
        }
    }
}

pub struct InMemoryClient {
    records: Mutex<BTreeMap<u64, Record>>,
    next_id: AtomicU64,
    offline: AtomicBool,
    latency: Duration,
    /// Extra latency for `get_one(id)`.
    delays: HashMap<u64, Duration>,
    /// Status returned by `get_one(id)` / `update(id, ..)` instead of the record.
    failures: HashMap<u64, i32>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            offline: AtomicBool::new(false),
            latency: Duration::ZERO,
            delays: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    /// Client pre-filled with records `1..=n`.
    pub fn seeded(n: u64) -> Self {
        let records = (1..=n)
            .map(|id| {
                let record = Record {
                    id,
                    name: format!("user-{id}"),
                    job: "member".to_string(),
                };
                (id, record)
            })
            .collect();
        Self {
            records: Mutex::new(records),
            next_id: AtomicU64::new(n + 1),
            ..Self::new()
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_delay(mut self, id: u64, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    pub fn with_failure(mut self, id: u64, status: i32) -> Self {
        self.failures.insert(id, status);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    async fn round_trip(&self, extra: Duration) -> Result<(), TransportError> {
        let wait = self.latency + extra;
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable(
                "in-memory client is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn injected_failure<T>(&self, id: u64) -> Option<RawResponse<T>> {
        self.failures
            .get(&id)
            .map(|&status| RawResponse::error(status, Some(format!("injected failure for id {id}"))))
    }
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkClient for InMemoryClient {
    type Item = Record;
    type Draft = RecordDraft;

    async fn get_list(&self, query: ListQuery) -> Result<RawResponse<Vec<Record>>, TransportError> {
        self.round_trip(Duration::ZERO).await?;

        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);

        let records = self.records.lock().await;
        let total = records.len() as u64;
        let total_pages = total.div_ceil(per_page as u64);
        let items: Vec<Record> = records
            .values()
            .skip(((page as u64 - 1) * per_page as u64) as usize)
            .take(per_page as usize)
            .cloned()
            .collect();

        let pagination = Pagination::new(
            page as i64,
            per_page as i64,
            total as i64,
            total_pages as i64,
        );
        Ok(RawResponse::ok(items).with_pagination(pagination))
    }

    async fn get_one(&self, id: u64) -> Result<RawResponse<Record>, TransportError> {
        let delay = self.delays.get(&id).copied().unwrap_or_default();
        self.round_trip(delay).await?;

        if let Some(failure) = self.injected_failure(id) {
            return Ok(failure);
        }
        let records = self.records.lock().await;
        Ok(match records.get(&id) {
            Some(record) => RawResponse::ok(record.clone()),
            None => RawResponse::error(404, None),
        })
    }

    async fn create(&self, draft: RecordDraft) -> Result<RawResponse<Record>, TransportError> {
        self.round_trip(Duration::ZERO).await?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = Record {
            id,
            name: draft.name,
            job: draft.job,
        };
        self.records.lock().await.insert(id, record.clone());

        let mut response = RawResponse::ok(record);
        response.status = 201;
        Ok(response)
    }

    async fn update(
        &self,
        id: u64,
        draft: RecordDraft,
    ) -> Result<RawResponse<Record>, TransportError> {
        self.round_trip(Duration::ZERO).await?;

        if let Some(failure) = self.injected_failure(id) {
            return Ok(failure);
        }
        let mut records = self.records.lock().await;
        Ok(match records.get_mut(&id) {
            Some(record) => {
                record.name = draft.name;
                record.job = draft.job;
                RawResponse::ok(record.clone())
            }
            None => RawResponse::error(404, None),
        })
    }
}
