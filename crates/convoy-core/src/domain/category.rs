//! FailureCategory - 失敗コードの分類
//!
//! A fixed lookup table from numeric failure codes to a human-readable
//! category. The table is immutable; unknown codes fall back to
//! [`UNRECOGNIZED`] instead of erroring.

use serde::{Deserialize, Serialize};

/// Sentinel code for failures that carry no usable status.
pub const UNRECOGNIZED_CODE: i32 = -1;

/// Transport succeeded.
pub const SUCCESS_CODE: i32 = 200;

/// The collaborator could not be reached at all.
pub const NO_CONNECTION_CODE: i32 = 1001;

/// The request (or a whole fan-out group) ran out of time.
pub const TIMEOUT_CODE: i32 = 1002;

/// The request was cancelled before it produced a result.
pub const CANCELLED_CODE: i32 = 1003;

/// Coarse classification of a failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    Success,
    NotFound,
    Server,
    Connectivity,
    Cancelled,
    Unrecognized,
}

/// One row of the classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureCategory {
    pub code: i32,
    pub kind: FailureKind,
    pub label: &'static str,
    /// Default message used when a failure is built without one.
    pub message: &'static str,
}

impl FailureCategory {
    const fn new(code: i32, kind: FailureKind, label: &'static str, message: &'static str) -> Self {
        Self {
            code,
            kind,
            label,
            message,
        }
    }

    /// Hint for callers that want to retry. The core itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, FailureKind::Server | FailureKind::Connectivity)
    }
}

/// Fallback for every code that is not in [`TABLE`].
pub const UNRECOGNIZED: FailureCategory = FailureCategory::new(
    UNRECOGNIZED_CODE,
    FailureKind::Unrecognized,
    "unrecognized",
    "something went wrong",
);

const TABLE: &[FailureCategory] = &[
    FailureCategory::new(SUCCESS_CODE, FailureKind::Success, "success", "request succeeded"),
    FailureCategory::new(400, FailureKind::NotFound, "not_found", "requested resource was not found"),
    FailureCategory::new(404, FailureKind::NotFound, "not_found", "requested resource was not found"),
    FailureCategory::new(
        500,
        FailureKind::Server,
        "internal_server_error",
        "server encountered an internal error",
    ),
    FailureCategory::new(
        502,
        FailureKind::Server,
        "bad_gateway",
        "server received an invalid upstream response",
    ),
    FailureCategory::new(
        503,
        FailureKind::Server,
        "service_unavailable",
        "service is temporarily unavailable",
    ),
    FailureCategory::new(504, FailureKind::Server, "gateway_timeout", "upstream server timed out"),
    FailureCategory::new(
        NO_CONNECTION_CODE,
        FailureKind::Connectivity,
        "no_connection",
        "network is unreachable",
    ),
    FailureCategory::new(TIMEOUT_CODE, FailureKind::Connectivity, "timeout", "request timed out"),
    FailureCategory::new(CANCELLED_CODE, FailureKind::Cancelled, "cancelled", "request was cancelled"),
];

/// Look up the category for `code`.
pub fn classify(code: i32) -> FailureCategory {
    TABLE
        .iter()
        .find(|category| category.code == code)
        .copied()
        .unwrap_or(UNRECOGNIZED)
}

/// Default message for `code` (the unrecognized message for unknown codes).
pub fn default_message(code: i32) -> &'static str {
    classify(code).message
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::ok(200, FailureKind::Success)]
    #[case::bad_request(400, FailureKind::NotFound)]
    #[case::not_found(404, FailureKind::NotFound)]
    #[case::internal(500, FailureKind::Server)]
    #[case::bad_gateway(502, FailureKind::Server)]
    #[case::unavailable(503, FailureKind::Server)]
    #[case::gateway_timeout(504, FailureKind::Server)]
    #[case::no_connection(1001, FailureKind::Connectivity)]
    #[case::timeout(1002, FailureKind::Connectivity)]
    #[case::cancelled(1003, FailureKind::Cancelled)]
    fn known_codes_keep_their_code(#[case] code: i32, #[case] kind: FailureKind) {
        let category = classify(code);
        assert_eq!(category.code, code);
        assert_eq!(category.kind, kind);
    }

    #[rstest]
    #[case(-1)]
    #[case(0)]
    #[case(201)]
    #[case(418)]
    #[case(i32::MAX)]
    fn unknown_codes_are_unrecognized(#[case] code: i32) {
        assert_eq!(classify(code), UNRECOGNIZED);
    }

    #[test]
    fn table_codes_are_unique() {
        for (i, a) in TABLE.iter().enumerate() {
            assert!(TABLE[i + 1..].iter().all(|b| b.code != a.code), "duplicate {}", a.code);
        }
    }

    #[test]
    fn only_server_and_connectivity_are_retryable() {
        assert!(classify(503).is_retryable());
        assert!(classify(1001).is_retryable());
        assert!(!classify(404).is_retryable());
        assert!(!classify(1003).is_retryable());
        assert!(!UNRECOGNIZED.is_retryable());
    }
}
