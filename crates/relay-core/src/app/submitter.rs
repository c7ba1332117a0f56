//! TaskSubmitter - dedup と schedule を組み合わせた submit のオーケストレーション
//!
//! # 状態遷移
//! materializing → scheduling → naming → guarding
//!   → (short-circuit-done | submitting → reconciling) → done
//!
//! # エラー方針
//! - `ConfigurationError` だけが `Err` で返る
//! - validation / missing param / backend の失敗は `SubmissionResult { ok: false }`
//! - backend の "already exists" は `{ ok: true, created_new_task: false }`

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::dedup::DedupGuard;
use super::materializer::RequestMaterializer;
use crate::config::DispatchConfig;
use crate::domain::{
    CallDescriptor, ConfigurationError, HttpDispatch, MaterializeError, QueueSubmission,
    ScheduleTime, SubmissionResult, SubmitOptions, TaskName, TypedRequest,
    compute_schedule_time_ms,
};
use crate::ports::{Clock, IdGenerator, SubmissionObserver, TaskBackend};

/// Submits deferred API calls with bucket-quantized schedule times and
/// in-process deduplication.
///
/// Build one with [`TaskSubmitterBuilder`](super::builder::TaskSubmitterBuilder).
pub struct TaskSubmitter {
    pub(super) backend: Arc<dyn TaskBackend>,
    pub(super) config: Arc<DispatchConfig>,
    pub(super) guard: Arc<DedupGuard>,
    pub(super) observer: Arc<dyn SubmissionObserver>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) ids: Arc<dyn IdGenerator>,
    pub(super) materializer: RequestMaterializer,
}

impl TaskSubmitter {
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn guard(&self) -> &DedupGuard {
        &self.guard
    }

    /// Materialize `request`, schedule it into its time bucket and create the
    /// remote task unless an equivalent one is already scheduled.
    pub async fn submit(
        &self,
        call: &CallDescriptor,
        request: &TypedRequest,
        options: &SubmitOptions,
    ) -> Result<SubmissionResult, ConfigurationError> {
        if !call.method().is_dispatchable() {
            return Err(ConfigurationError::UnsupportedMethod(call.method()));
        }

        let mode = options
            .validation_mode
            .unwrap_or(self.config.validation_mode);
        let materialized = match self
            .materializer
            .materialize(call, request, mode, self.observer.as_ref())
            .await
        {
            Ok(m) => m,
            Err(MaterializeError::Configuration(e)) => return Err(e),
            Err(e) => {
                warn!(call = call.name(), error = %e, "request materialization failed");
                return Ok(SubmissionResult::failed(e.to_string()));
            }
        };

        let now_ms = self.clock.now_ms();
        let schedule_ms = compute_schedule_time_ms(
            now_ms,
            options.delay_ms,
            options.limit_mode,
            options.bucket_size_ms,
        );

        let route = self.config.resolve(call.routing_class());
        let url = match route.absolute_url(&materialized.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    call = call.name(),
                    url = %materialized.url,
                    error = %e,
                    "cannot resolve request URL"
                );
                return Ok(SubmissionResult::failed(format!(
                    "Invalid URL {}: {e}",
                    materialized.url
                )));
            }
        };
        let name = TaskName::for_call(
            call,
            options.limit_type,
            options.bucket_size_ms,
            &options.name_extension,
            schedule_ms,
        )
        .map(|n| route.locator.task_path(&n));

        if let Some(name) = &name {
            let expires_at_ms = schedule_ms
                .saturating_add(options.bucket_size_ms)
                .saturating_add(self.config.dedup.retention_ms);
            if !self.guard.try_reserve(name, expires_at_ms, now_ms) {
                debug!(call = call.name(), task = %name, "already scheduled, skipping backend call");
                return Ok(SubmissionResult::deduplicated());
            }
        }

        let submission = QueueSubmission {
            locator: route.locator.clone(),
            name: name.clone(),
            schedule_time: ScheduleTime::future_only(schedule_ms, now_ms),
            dispatch: HttpDispatch {
                method: call.method(),
                url,
                headers: materialized.headers,
                body: materialized.body,
                auth: route.auth.clone(),
            },
        };

        let request_id = self.ids.generate_request_id();
        self.observer.on_will_submit(call, request, request_id);

        match self
            .backend
            .create_task(&submission, &options.call_options)
            .await
        {
            Ok(task) => {
                self.observer
                    .on_did_submit(call, request, request_id, &task);
                info!(
                    call = call.name(),
                    %request_id,
                    task = %task.name,
                    schedule_ms,
                    "task created"
                );
                Ok(SubmissionResult::created())
            }
            Err(e) if e.is_already_exists() => {
                if let Some(name) = &name {
                    self.guard.confirm_conflict(name);
                }
                debug!(call = call.name(), %request_id, "task already exists remotely");
                Ok(SubmissionResult::deduplicated())
            }
            Err(e) => {
                if let Some(name) = &name {
                    self.guard.release(name);
                }
                warn!(call = call.name(), %request_id, error = %e, "task creation failed");
                Ok(SubmissionResult::failed(e.message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::TaskSubmitterBuilder;
    use crate::config::{RouteConfig, RouteOverrides};
    use crate::domain::{
        EncodingKind, HttpMethod, LimitMode, LimitType, RequestId, RequestPart, TaskHandle,
    };
    use crate::impls::InMemoryTaskBackend;
    use crate::ports::{FixedClock, ValidationIssue, ValidationMode};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    const NOW_MS: i64 = 1_700_000_001_001;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SubmissionObserver for Recorder {
        fn on_will_submit(&self, call: &CallDescriptor, _req: &TypedRequest, _id: RequestId) {
            self.events.lock().unwrap().push(format!("will:{}", call.name()));
        }

        fn on_did_submit(
            &self,
            _call: &CallDescriptor,
            _req: &TypedRequest,
            _id: RequestId,
            task: &TaskHandle,
        ) {
            self.events.lock().unwrap().push(format!("did:{}", task.name));
        }

        fn on_validation_error(
            &self,
            _call: &CallDescriptor,
            _req: &TypedRequest,
            part: RequestPart,
            _issue: &ValidationIssue,
        ) {
            self.events.lock().unwrap().push(format!("invalid:{part}"));
        }
    }

    struct Fixture {
        submitter: Arc<TaskSubmitter>,
        backend: Arc<InMemoryTaskBackend>,
        recorder: Arc<Recorder>,
        clock: Arc<FixedClock>,
    }

    fn config() -> DispatchConfig {
        let mut config = DispatchConfig::default();
        config.set_defaults(RouteConfig {
            project: "acme".to_string(),
            location: "us-central1".to_string(),
            queue: "jobs".to_string(),
            service_account_email: "tasks@acme.iam".to_string(),
            url_base: Some("https://api.acme.test".to_string()),
        });
        config
            .with_route(
                "internal",
                RouteOverrides {
                    queue: Some("internal-jobs".to_string()),
                    ..RouteOverrides::default()
                },
            )
            .with_route(
                "versioned",
                RouteOverrides {
                    url_base: Some("https://api.acme.test/v1/".to_string()),
                    ..RouteOverrides::default()
                },
            )
            .with_route(
                "broken",
                RouteOverrides {
                    url_base: Some("not a url".to_string()),
                    ..RouteOverrides::default()
                },
            )
    }

    fn fixture_with(backend: InMemoryTaskBackend) -> Fixture {
        let backend = Arc::new(backend);
        let recorder = Arc::new(Recorder::default());
        let clock = Arc::new(FixedClock::from_epoch_ms(NOW_MS));
        let submitter = TaskSubmitterBuilder::new()
            .backend(backend.clone())
            .config(config())
            .observer(recorder.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        Fixture {
            submitter: Arc::new(submitter),
            backend,
            recorder,
            clock,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(InMemoryTaskBackend::new())
    }

    fn call() -> CallDescriptor {
        CallDescriptor::new("sendReminder", HttpMethod::Post, "/reminders/{id}/send")
    }

    fn request() -> TypedRequest {
        TypedRequest::new()
            .with_params(&json!({ "id": "r1" }))
            .unwrap()
            .with_body(&json!({ "channel": "email" }))
            .unwrap()
    }

    #[tokio::test]
    async fn creates_named_task_at_trailing_edge() {
        let f = fixture();
        let result = f
            .submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(result, SubmissionResult::created());
        let created = f.backend.submissions();
        assert_eq!(created.len(), 1);
        let sub = &created[0];
        assert_eq!(
            sub.name.as_deref(),
            Some("projects/acme/locations/us-central1/queues/jobs/tasks/sendReminder--1700000001250")
        );
        assert_eq!(
            sub.schedule_time.map(|t| t.epoch_ms()),
            Some(1_700_000_001_250)
        );
        assert_eq!(sub.dispatch.url, "https://api.acme.test/reminders/r1/send");
        assert_eq!(sub.dispatch.method, HttpMethod::Post);
        assert_eq!(sub.dispatch.auth.service_account_email, "tasks@acme.iam");
        assert_eq!(sub.dispatch.body, Some(b"{\"channel\":\"email\"}".to_vec()));
        assert_eq!(
            f.recorder.events(),
            vec![
                "will:sendReminder".to_string(),
                "did:projects/acme/locations/us-central1/queues/jobs/tasks/sendReminder--1700000001250"
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn leading_edge_in_the_past_sends_no_schedule_time() {
        let f = fixture();
        let opts = SubmitOptions::default().with_limit_mode(LimitMode::Leading);
        f.submitter.submit(&call(), &request(), &opts).await.unwrap();

        let sub = &f.backend.submissions()[0];
        assert_eq!(sub.schedule_time, None);
        assert!(sub.name.as_deref().unwrap().ends_with("-1700000001000"));
    }

    #[tokio::test]
    async fn routing_class_selects_queue() {
        let f = fixture();
        let call = call().with_routing_class("internal");
        f.submitter
            .submit(&call, &request(), &SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(f.backend.submissions()[0].locator.queue, "internal-jobs");
    }

    #[tokio::test]
    async fn same_bucket_is_deduplicated_locally() {
        let f = fixture();
        let first = f
            .submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();
        f.clock.advance_ms(100);
        let second = f
            .submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(first, SubmissionResult::created());
        assert_eq!(second, SubmissionResult::deduplicated());
        assert_eq!(f.backend.call_count(), 1);
    }

    #[tokio::test]
    async fn next_bucket_creates_a_new_task() {
        let f = fixture();
        f.submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();
        f.clock.advance_ms(300);
        let second = f
            .submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(second, SubmissionResult::created());
        assert_eq!(f.backend.call_count(), 2);
    }

    #[tokio::test]
    async fn name_extension_separates_keys() {
        let f = fixture();
        for ext in ["user-1", "user-2"] {
            let opts = SubmitOptions::default().with_name_extension(ext);
            let result = f.submitter.submit(&call(), &request(), &opts).await.unwrap();
            assert!(result.created_new_task);
        }
        assert_eq!(f.backend.call_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_burst_reaches_backend_once() {
        let f = fixture_with(InMemoryTaskBackend::new().with_latency(Duration::from_millis(20)));

        let joins: Vec<_> = (0..10)
            .map(|_| {
                let submitter = Arc::clone(&f.submitter);
                tokio::spawn(async move {
                    submitter
                        .submit(&call(), &request(), &SubmitOptions::default())
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = 0;
        for j in joins {
            let result = j.await.unwrap();
            assert!(result.ok);
            if result.created_new_task {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(f.backend.call_count(), 1);
    }

    #[tokio::test]
    async fn remote_conflict_is_success_and_keeps_reservation() {
        let f = fixture();
        let name = "projects/acme/locations/us-central1/queues/jobs/tasks/sendReminder--1700000001250";
        f.backend.preload(name);

        let result = f
            .submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(result, SubmissionResult::deduplicated());
        assert!(f.submitter.guard().contains(name));
        assert_eq!(f.recorder.events(), vec!["will:sendReminder".to_string()]);

        // reservation kept: the next call never reaches the backend
        f.submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(f.backend.call_count(), 1);
    }

    #[tokio::test]
    async fn backend_failure_releases_reservation() {
        let f = fixture_with(InMemoryTaskBackend::new().fail_next(1));

        let first = f
            .submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();
        assert!(!first.ok);
        assert!(first.error.is_some());
        assert!(f.submitter.guard().is_empty());

        let retry = f
            .submitter
            .submit(&call(), &request(), &SubmitOptions::default())
            .await
            .unwrap();
        assert_eq!(retry, SubmissionResult::created());
        assert_eq!(f.backend.call_count(), 2);
    }

    #[tokio::test]
    async fn limiting_disabled_bypasses_guard() {
        let f = fixture();
        let opts = SubmitOptions::default().with_limit_type(LimitType::None);
        for _ in 0..3 {
            let result = f.submitter.submit(&call(), &request(), &opts).await.unwrap();
            assert_eq!(result, SubmissionResult::created());
        }
        assert_eq!(f.backend.call_count(), 3);
        assert!(f.backend.submissions().iter().all(|s| s.name.is_none()));
        assert!(f.submitter.guard().is_empty());
    }

    #[tokio::test]
    async fn zero_bucket_bypasses_guard() {
        let f = fixture();
        let opts = SubmitOptions::default()
            .with_bucket_size_ms(0)
            .with_delay_ms(5_000);
        f.submitter.submit(&call(), &request(), &opts).await.unwrap();
        f.submitter.submit(&call(), &request(), &opts).await.unwrap();

        assert_eq!(f.backend.call_count(), 2);
        let sub = &f.backend.submissions()[0];
        assert_eq!(sub.name, None);
        assert_eq!(sub.schedule_time.map(|t| t.epoch_ms()), Some(NOW_MS + 5_000));
    }

    #[tokio::test]
    async fn missing_param_is_a_failed_result() {
        let f = fixture();
        let req = TypedRequest::new().with_params(&json!({})).unwrap();
        let result = f
            .submitter
            .submit(&call(), &req, &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(result, SubmissionResult::failed("Missing param value for id"));
        assert_eq!(f.backend.call_count(), 0);
        assert!(f.submitter.guard().is_empty());
    }

    #[tokio::test]
    async fn hard_validation_failure_is_a_failed_result() {
        use crate::ports::{RequestSchema, SerializedPart};
        use async_trait::async_trait;

        struct Reject;

        #[async_trait]
        impl RequestSchema for Reject {
            async fn serialize(
                &self,
                value: Option<&serde_json::Value>,
                _mode: ValidationMode,
            ) -> SerializedPart {
                SerializedPart::invalid(value.cloned(), ValidationIssue::new("nope"))
            }
        }

        let f = fixture();
        let call = call().with_body_schema(Arc::new(Reject));
        let result = f
            .submitter
            .submit(&call, &request(), &SubmitOptions::default())
            .await
            .unwrap();

        assert_eq!(
            result,
            SubmissionResult::failed("Request body validation error: nope")
        );
        assert_eq!(f.recorder.events(), vec!["invalid:body".to_string()]);
        assert_eq!(f.backend.call_count(), 0);

        let soft = SubmitOptions::default().with_validation_mode(ValidationMode::Soft);
        let result = f.submitter.submit(&call, &request(), &soft).await.unwrap();
        assert_eq!(result, SubmissionResult::created());
    }

    #[tokio::test]
    async fn disallowed_method_is_a_configuration_error() {
        let f = fixture();
        let call = CallDescriptor::new("link", HttpMethod::Link, "/x");
        let err = f
            .submitter
            .submit(&call, &TypedRequest::new(), &SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnsupportedMethod(HttpMethod::Link));
        assert!(f.recorder.events().is_empty());
    }

    #[tokio::test]
    async fn unsupported_encoding_is_a_configuration_error() {
        let f = fixture();
        let call = call().with_encoding(EncodingKind::Binary);
        let err = f
            .submitter
            .submit(&call, &request(), &SubmitOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnsupportedEncoding(EncodingKind::Binary));
        assert_eq!(f.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn url_resolves_against_base_path() {
        let f = fixture();
        let relative = CallDescriptor::new("sendReminder", HttpMethod::Post, "reminders/{id}/send")
            .with_routing_class("versioned");
        let rooted = call().with_routing_class("versioned");

        f.submitter
            .submit(&relative, &request(), &SubmitOptions::default())
            .await
            .unwrap();
        f.submitter
            .submit(&rooted, &request(), &SubmitOptions::default().with_name_extension("rooted"))
            .await
            .unwrap();

        let urls: Vec<String> = f
            .backend
            .submissions()
            .into_iter()
            .map(|s| s.dispatch.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://api.acme.test/v1/reminders/r1/send".to_string(),
                "https://api.acme.test/reminders/r1/send".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn unresolvable_url_is_a_failed_result() {
        let f = fixture();
        let call = call().with_routing_class("broken");
        let result = f
            .submitter
            .submit(&call, &request(), &SubmitOptions::default())
            .await
            .unwrap();

        assert!(!result.ok);
        assert!(result.error.unwrap().starts_with("Invalid URL /reminders/r1/send"));
        assert_eq!(f.backend.call_count(), 0);
        assert!(f.submitter.guard().is_empty());
    }

    #[tokio::test]
    async fn huge_bucket_keeps_reservation() {
        let f = fixture();
        let opts = SubmitOptions::default().with_bucket_size_ms(i64::MAX);

        let first = f.submitter.submit(&call(), &request(), &opts).await.unwrap();
        let second = f.submitter.submit(&call(), &request(), &opts).await.unwrap();

        assert_eq!(first, SubmissionResult::created());
        assert_eq!(second, SubmissionResult::deduplicated());
        assert_eq!(
            f.backend.submissions()[0].schedule_time.map(|t| t.epoch_ms()),
            Some(i64::MAX)
        );
        assert_eq!(f.backend.call_count(), 1);
    }

    #[tokio::test]
    async fn huge_delay_keeps_reservation() {
        let f = fixture();
        let opts = SubmitOptions::default().with_delay_ms(i64::MAX);

        let first = f.submitter.submit(&call(), &request(), &opts).await.unwrap();
        let second = f.submitter.submit(&call(), &request(), &opts).await.unwrap();

        assert_eq!(first, SubmissionResult::created());
        assert_eq!(second, SubmissionResult::deduplicated());
        assert_eq!(f.backend.call_count(), 1);
    }
}
