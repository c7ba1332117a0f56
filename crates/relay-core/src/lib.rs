//! relay-core
//!
//! Deferred API calls submitted to a remote task queue, with bucket-quantized
//! schedule times and name-based deduplication.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（call descriptor, request, schedule, task name, submission, errors）
//! - **ports**: 抽象化レイヤー（TaskBackend, RequestSchema, SubmissionObserver, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, submitter, materializer, dedup guard, encoding, url）
//! - **impls**: 実装（InMemoryTaskBackend, TracingObserver）
//! - **config**: routing class ごとの宛先設定（TOML）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
