//! Domain model (envelope, failure classification, task state, IDs, errors).
//!
//! 副作用なしの純粋なデータ型のみ。非同期処理は `app` 側に置く。

pub mod category;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod state;

pub use self::category::{
    CANCELLED_CODE, FailureCategory, FailureKind, NO_CONNECTION_CODE, SUCCESS_CODE, TIMEOUT_CODE,
    UNRECOGNIZED, UNRECOGNIZED_CODE, classify,
};
pub use self::envelope::{AGGREGATE_FAILURE_MESSAGE, Pagination, ResultEnvelope};
pub use self::errors::{ConvoyError, TransportError};
pub use self::ids::{GroupId, TaskId};
pub use self::state::TaskState;
