//! TaskSubmitterBuilder - submitter の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use super::dedup::DedupGuard;
use super::encoding::EncoderTable;
use super::materializer::RequestMaterializer;
use super::submitter::TaskSubmitter;
use crate::config::DispatchConfig;
use crate::domain::RoutingClass;
use crate::ports::{
    Clock, IdGenerator, NoopObserver, RequestSchema, SubmissionObserver, SystemClock, TaskBackend,
    UlidGenerator,
};

/// TaskSubmitterBuilder は TaskSubmitter を構築
///
/// # 使用例
/// ```ignore
/// let submitter = TaskSubmitterBuilder::new()
///     .backend(Arc::new(InMemoryTaskBackend::new()))
///     .config(DispatchConfig::load("relay.toml")?)
///     .expect_routes(&["default", "internal"])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - backend が未設定なら build() で BuildError
/// - expect_routes() で指定した routing class が project / location / queue を
///   解決できなければ BuildError
/// - 省略したコンポーネントは SystemClock / UlidGenerator / NoopObserver / 空のガード
pub struct TaskSubmitterBuilder {
    backend: Option<Arc<dyn TaskBackend>>,
    config: DispatchConfig,
    guard: Option<Arc<DedupGuard>>,
    observer: Arc<dyn SubmissionObserver>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    encoders: EncoderTable,
    fallback_schema: Option<Arc<dyn RequestSchema>>,
    expected_routes: Option<Vec<String>>,
}

/// BuildError は submitter 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No task backend configured")]
    MissingBackend,

    #[error("Incomplete routes: {0:?}. These routing classes resolve to an empty project, location or queue.")]
    IncompleteRoutes(Vec<String>),
}

impl TaskSubmitterBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            config: DispatchConfig::default(),
            guard: None,
            observer: Arc::new(NoopObserver),
            clock: Arc::new(SystemClock),
            ids: None,
            encoders: EncoderTable::default(),
            fallback_schema: None,
            expected_routes: None,
        }
    }

    pub fn backend(mut self, backend: Arc<dyn TaskBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Share one guard between several submitters of the same process.
    pub fn guard(mut self, guard: Arc<DedupGuard>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SubmissionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn encoders(mut self, encoders: EncoderTable) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn fallback_schema(mut self, schema: Arc<dyn RequestSchema>) -> Self {
        self.fallback_schema = Some(schema);
        self
    }

    /// 期待される routing class のリストを設定
    pub fn expect_routes(mut self, routing_classes: &[&str]) -> Self {
        self.expected_routes = Some(routing_classes.iter().map(|s| s.to_string()).collect());
        self
    }

    /// TaskSubmitter を生成
    ///
    /// # 検証
    /// - backend が設定されているか
    /// - expect_routes() の各 routing class が完全に解決できるか
    pub fn build(self) -> Result<TaskSubmitter, BuildError> {
        let backend = self.backend.ok_or(BuildError::MissingBackend)?;

        if let Some(expected) = &self.expected_routes {
            let incomplete: Vec<String> = expected
                .iter()
                .filter(|class| {
                    let locator = self.config.resolve(&RoutingClass::new(class.as_str())).locator;
                    locator.project.is_empty()
                        || locator.location.is_empty()
                        || locator.queue.is_empty()
                })
                .cloned()
                .collect();
            if !incomplete.is_empty() {
                return Err(BuildError::IncompleteRoutes(incomplete));
            }
        }

        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(self.clock.clone())));
        let mut materializer = RequestMaterializer::new(self.encoders);
        if let Some(schema) = self.fallback_schema {
            materializer = materializer.with_fallback_schema(schema);
        }

        Ok(TaskSubmitter {
            backend,
            config: Arc::new(self.config),
            guard: self.guard.unwrap_or_default(),
            observer: self.observer,
            clock: self.clock,
            ids,
            materializer,
        })
    }
}

impl Default for TaskSubmitterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
