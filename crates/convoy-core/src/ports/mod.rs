//! Ports - 外部コラボレータとの境界
//!
//! コアが消費する外部システムの interface をここに置く。
//! 実装の詳細（HTTP, JSON mapping）はコアの外。

pub mod network;

pub use self::network::{ListQuery, NetworkClient, RawResponse};
