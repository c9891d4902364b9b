//! Impls - ports の実装（開発用・テスト用）
//!
//! 本番用の NetworkClient（HTTP）はコアの外に置く。

pub mod inmem_client;

pub use self::inmem_client::{InMemoryClient, Record, RecordDraft};
