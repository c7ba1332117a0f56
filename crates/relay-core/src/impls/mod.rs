//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryTaskBackend**: 開発・テスト用の TaskBackend
//! - **TracingObserver**: hook を tracing で出力する SubmissionObserver
//!
//! # 本番用実装
//! 実際のタスクキュー RPC クライアントは別クレートで TaskBackend を実装します。

pub mod inmem_backend;
pub mod tracing_observer;

// 主要な型を再エクスポート
pub use self::inmem_backend::InMemoryTaskBackend;
pub use self::tracing_observer::TracingObserver;
