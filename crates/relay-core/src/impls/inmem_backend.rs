//! InMemoryTaskBackend - 開発・テスト用のタスクキュー backend
//!
//! # 学習ポイント
//! - Mutex + HashMap による name の一意性チェック（AlreadyExists を再現）
//! - ロックを保持したまま await しない（latency の sleep はロック外）
//! - fail_next(n) で一時的な障害を注入できる

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ulid::Ulid;

use crate::domain::{BackendError, CallOptions, QueueSubmission, TaskHandle};
use crate::ports::TaskBackend;

#[derive(Debug, Default)]
struct BackendState {
    /// every known task name, preloaded ones included
    names: HashSet<String>,
    /// creation order
    created: Vec<(QueueSubmission, TaskHandle)>,
    fail_remaining: usize,
}

/// InMemoryTaskBackend は開発用の backend
///
/// # 実装詳細
/// - 作成済みタスクを作成順に保持
/// - 同名タスクは `BackendError::already_exists`
/// - name 無しの submission には `{queue}/tasks/{ulid}` を割り当てる
///
/// # 使用例
/// ```ignore
/// let backend = InMemoryTaskBackend::new().with_latency(Duration::from_millis(20));
/// backend.create_task(&submission, &CallOptions::default()).await?;
/// assert_eq!(backend.tasks().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTaskBackend {
    state: Mutex<BackendState>,
    calls: AtomicUsize,
    latency: Option<Duration>,
}

impl InMemoryTaskBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, so concurrent submissions overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The next `n` calls fail with `Unavailable`.
    pub fn fail_next(self, n: usize) -> Self {
        self.lock().fail_remaining = n;
        self
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an existing task name, as if another process had created it.
    pub fn preload(&self, name: impl Into<String>) {
        self.lock().names.insert(name.into());
    }

    /// Number of `create_task` calls, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Created tasks in creation order, excluding preloaded ones.
    pub fn tasks(&self) -> Vec<TaskHandle> {
        self.lock().created.iter().map(|(_, h)| h.clone()).collect()
    }

    /// Submissions that created a task, in creation order.
    pub fn submissions(&self) -> Vec<QueueSubmission> {
        self.lock().created.iter().map(|(s, _)| s.clone()).collect()
    }

    fn insert(&self, submission: &QueueSubmission) -> Result<TaskHandle, BackendError> {
        let mut state = self.lock();

        if state.fail_remaining > 0 {
            state.fail_remaining -= 1;
            return Err(BackendError::unavailable("backend unavailable (injected)"));
        }

        let name = submission
            .name
            .clone()
            .unwrap_or_else(|| format!("{}/tasks/{}", submission.locator, Ulid::new()));
        if state.names.contains(&name) {
            return Err(BackendError::already_exists(format!(
                "task {name} already exists"
            )));
        }

        let handle = TaskHandle {
            name: name.clone(),
            schedule_time: submission.schedule_time,
        };
        state.names.insert(name);
        state.created.push((submission.clone(), handle.clone()));
        Ok(handle)
    }
}

#[async_trait]
impl TaskBackend for InMemoryTaskBackend {
    async fn create_task(
        &self,
        submission: &QueueSubmission,
        options: &CallOptions,
    ) -> Result<TaskHandle, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            if let Some(timeout) = options.timeout
                && timeout < latency
            {
                tokio::time::sleep(timeout).await;
                return Err(BackendError::unavailable("deadline exceeded"));
            }
            tokio::time::sleep(latency).await;
        }

        self.insert(submission)
    }
}
