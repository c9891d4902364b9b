//! Errors - エラー型と分類
//!
//! `TransportError` is what the network collaborator reports; `ConvoyError`
//! is what the executor and `Task::run_with_timeout` surface. Both map onto
//! the classifier codes in [`super::category`].

use std::time::Duration;

use thiserror::Error;

use super::category::{
    CANCELLED_CODE, NO_CONNECTION_CODE, TIMEOUT_CODE, UNRECOGNIZED_CODE, default_message,
};

/// Transport-level failure reported by a `NetworkClient`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("transport timed out")]
    TimedOut,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Classifier code, if the error maps onto one.
    pub fn code(&self) -> Option<i32> {
        match self {
            TransportError::Unreachable(_) => Some(NO_CONNECTION_CODE),
            TransportError::TimedOut => Some(TIMEOUT_CODE),
            TransportError::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvoyError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The collaborator answered with a non-success status.
    #[error("request failed with status {code}: {message}")]
    Status { code: i32, message: String },

    /// Success status, but no payload to hand back.
    #[error("response payload was empty")]
    EmptyPayload { code: i32 },

    #[error("request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("request was cancelled")]
    Cancelled,

    #[error("one or more request failed (code {code})")]
    FanOut { code: i32 },

    /// A worker panicked or returned something it must not.
    #[error("{0}")]
    Fault(String),
}

impl ConvoyError {
    pub fn status(code: i32, message: Option<String>) -> Self {
        ConvoyError::Status {
            code,
            message: message.unwrap_or_else(|| default_message(code).to_string()),
        }
    }

    /// Classifier code for this error.
    pub fn code(&self) -> i32 {
        match self {
            ConvoyError::Transport(e) => e.code().unwrap_or(UNRECOGNIZED_CODE),
            ConvoyError::Status { code, .. } => *code,
            ConvoyError::EmptyPayload { code } => *code,
            ConvoyError::Timeout { .. } => TIMEOUT_CODE,
            ConvoyError::Cancelled => CANCELLED_CODE,
            ConvoyError::FanOut { code } => *code,
            ConvoyError::Fault(_) => UNRECOGNIZED_CODE,
        }
    }
}
