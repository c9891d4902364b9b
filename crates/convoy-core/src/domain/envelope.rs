//! ResultEnvelope - 非同期処理の結果を運ぶ共通フォーマット
//!
//! Every operation in the crate hands its outcome to the caller as a
//! `ResultEnvelope`: still loading, succeeded with a payload, or failed with
//! a classifier code.
//!
//! Serialized as `{"status": "LOADING" | "SUCCESS" | "FAILURE", ...}` so the
//! presentation side can log or forward it as-is.

use serde::{Deserialize, Serialize};

use super::category::{UNRECOGNIZED_CODE, default_message};
use super::errors::ConvoyError;

/// Message of the single failure a fan-out reports when any member fails.
pub const AGGREGATE_FAILURE_MESSAGE: &str = "one or more request failed";

/// Pagination metadata attached to a success.
///
/// `-1` means "not provided", which is different from a page that happens to
/// hold zero items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub const UNKNOWN: i64 = -1;

    pub fn new(page: i64, per_page: i64, total: i64, total_pages: i64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::default()
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(Self::UNKNOWN, Self::UNKNOWN, Self::UNKNOWN, Self::UNKNOWN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultEnvelope<T> {
    Loading,

    Success {
        payload: T,
        page: i64,
        per_page: i64,
        total: i64,
        total_pages: i64,
    },

    Failure {
        code: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl<T> ResultEnvelope<T> {
    /// Success without pagination (all fields `-1`).
    pub fn success(payload: T) -> Self {
        Self::success_paged(payload, Pagination::default())
    }

    pub fn success_paged(payload: T, pagination: Pagination) -> Self {
        ResultEnvelope::Success {
            payload,
            page: pagination.page,
            per_page: pagination.per_page,
            total: pagination.total,
            total_pages: pagination.total_pages,
        }
    }

    /// Failure carrying the classifier's default message for `code`.
    pub fn failure(code: i32) -> Self {
        ResultEnvelope::Failure {
            code,
            message: Some(default_message(code).to_string()),
        }
    }

    pub fn failure_with(code: i32, message: impl Into<String>) -> Self {
        ResultEnvelope::Failure {
            code,
            message: Some(message.into()),
        }
    }

    pub fn unrecognized() -> Self {
        Self::failure(UNRECOGNIZED_CODE)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ResultEnvelope::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ResultEnvelope::Failure { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ResultEnvelope::Success { payload, .. } => Some(payload),
            _ => None,
        }
    }

    pub fn pagination(&self) -> Option<Pagination> {
        match self {
            ResultEnvelope::Success {
                page,
                per_page,
                total,
                total_pages,
                ..
            } => Some(Pagination::new(*page, *per_page, *total, *total_pages)),
            _ => None,
        }
    }

    pub fn failure_code(&self) -> Option<i32> {
        match self {
            ResultEnvelope::Failure { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            ResultEnvelope::Failure { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Transform the payload, keeping pagination and failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultEnvelope<U> {
        match self {
            ResultEnvelope::Loading => ResultEnvelope::Loading,
            ResultEnvelope::Success {
                payload,
                page,
                per_page,
                total,
                total_pages,
            } => ResultEnvelope::Success {
                payload: f(payload),
                page,
                per_page,
                total,
                total_pages,
            },
            ResultEnvelope::Failure { code, message } => ResultEnvelope::Failure { code, message },
        }
    }

    /// `Loading` is not a terminal value, so it converts into a fault.
    pub fn into_result(self) -> Result<T, ConvoyError> {
        match self {
            ResultEnvelope::Success { payload, .. } => Ok(payload),
            ResultEnvelope::Failure { code, message } => Err(ConvoyError::status(code, message)),
            ResultEnvelope::Loading => Err(ConvoyError::Fault(
                "envelope is still loading".to_string(),
            )),
        }
    }
}

impl<T> From<ConvoyError> for ResultEnvelope<T> {
    fn from(err: ConvoyError) -> Self {
        let code = err.code();
        match err {
            // 集約失敗のメッセージは固定
            ConvoyError::FanOut { .. } => {
                ResultEnvelope::failure_with(code, AGGREGATE_FAILURE_MESSAGE)
            }
            ConvoyError::Status { message, .. } => ResultEnvelope::failure_with(code, message),
            ConvoyError::Fault(_) => ResultEnvelope::unrecognized(),
            other => ResultEnvelope::failure_with(code, other.to_string()),
        }
    }
}
