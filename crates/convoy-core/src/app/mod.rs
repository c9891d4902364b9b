//! App - アプリケーション層
//!
//! domain と ports を組み合わせて、リクエストの実行・並列化・キャンセルを行う。
//!
//! # 主要コンポーネント
//! - **Task**: 1 回分のリクエスト（状態・キャンセルトークン付き）
//! - **SequentialExecutor**: 単発実行（任意の timeout）
//! - **FanOut**: 並列実行。1 件失敗したら全体をキャンセル
//! - **CancellationDomain**: FanOut の 1 回分を束ねるキャンセル範囲
//! - **Requests**: NetworkClient を束縛した Task の生成
//! - **delivery**: presentation 層への受け渡し（once / stream）

pub mod cancel;
pub mod delivery;
pub mod executor;
pub mod fanout;
pub mod requests;
pub mod task;

// 主要な型を再エクスポート
pub use self::cancel::{CancellationDomain, TaskCancelHandle};
pub use self::delivery::{request_once, request_stream};
pub use self::executor::SequentialExecutor;
pub use self::fanout::FanOut;
pub use self::requests::Requests;
pub use self::task::Task;
