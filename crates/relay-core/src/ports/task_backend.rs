//! TaskBackend port - リモートのタスクキュー（create task RPC）
//!
//! 認証やRPC内部のリトライは実装側の責務です。
//!
//! # 実装
//! - **InMemoryTaskBackend**: 開発・テスト用（impls/inmem_backend）

use async_trait::async_trait;

use crate::domain::{BackendError, CallOptions, QueueSubmission, TaskHandle};

/// TaskBackend は QueueSubmission を 1 つのリモートタスクとして作成
///
/// # 設計原則
/// - name が指定され、同名タスクが既に存在する場合は
///   `BackendErrorKind::AlreadyExists` を返すこと（冪等性の根拠）
/// - name が `None` なら backend が ID を割り当てる
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn create_task(
        &self,
        submission: &QueueSubmission,
        options: &CallOptions,
    ) -> Result<TaskHandle, BackendError>;
}
