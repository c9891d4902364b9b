//! convoy-core
//!
//! Coordinated async requests with a uniform result envelope.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（envelope, failure category, errors, state, ids）
//! - **ports**: 抽象化レイヤー（NetworkClient）
//! - **app**: アプリケーションロジック（task, executor, fanout, cancel, delivery, requests）
//! - **impls**: 実装（InMemoryClient など開発用）
//! - **config**: 実行設定（timeout, max_in_flight, paging defaults）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use crate::app::{
    CancellationDomain, FanOut, Requests, SequentialExecutor, Task, TaskCancelHandle,
    request_once, request_stream,
};
pub use crate::config::{ConfigError, ConvoyConfig};
pub use crate::domain::{ConvoyError, FailureCategory, Pagination, ResultEnvelope, TaskState};
pub use crate::ports::{NetworkClient, RawResponse};
