//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 外部コラボレータ（schema ライブラリ、タスクキュー backend、時計、ID 生成、hook）
//! への境界だけを trait で表現し、実装の詳細を隠蔽します。

pub mod clock;
pub mod id_generator;
pub mod observer;
pub mod schema;
pub mod task_backend;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::observer::{NoopObserver, SubmissionObserver};
pub use self::schema::{
    PermissiveSchema, RequestSchema, SerializedPart, ValidationIssue, ValidationMode,
};
pub use self::task_backend::TaskBackend;
