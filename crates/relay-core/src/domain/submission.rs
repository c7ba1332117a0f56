//! Submission - backend へ渡す payload と、呼び出し側へ返す結果
//!
//! QueueSubmission は 1 回の backend 呼び出しに必要な全情報です。
//! SubmissionResult は submit の構造化された戻り値です。

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::call::HttpMethod;
use super::schedule::{LimitMode, ScheduleTime};
use super::task_name::{LimitType, TaskName};
use crate::ports::ValidationMode;

/// Default bucket width for coalescing.
pub const DEFAULT_BUCKET_SIZE_MS: i64 = 250;

/// `projects/{project}/locations/{location}/queues/{queue}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueLocator {
    pub project: String,
    pub location: String,
    pub queue: String,
}

impl QueueLocator {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
            queue: queue.into(),
        }
    }

    /// Full resource path of a task in this queue.
    pub fn task_path(&self, name: &TaskName) -> String {
        format!("{self}/tasks/{name}")
    }
}

impl fmt::Display for QueueLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/queues/{}",
            self.project, self.location, self.queue
        )
    }
}

/// Identity the backend authenticates as when it dispatches the HTTP call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPrincipal {
    pub service_account_email: String,
}

/// The HTTP call the backend will make when the task fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpDispatch {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub auth: AuthPrincipal,
}

/// Everything needed for one `create_task` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSubmission {
    pub locator: QueueLocator,
    /// Full task resource path; `None` lets the backend assign one.
    pub name: Option<String>,
    /// Only set when the instant is in the future.
    pub schedule_time: Option<ScheduleTime>,
    pub dispatch: HttpDispatch,
}

/// Opaque per-call options forwarded to the backend untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
}

/// Reference to a task the backend created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub name: String,
    pub schedule_time: Option<ScheduleTime>,
}

/// Per-submission knobs.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// `None` uses the configured default.
    pub validation_mode: Option<ValidationMode>,
    pub delay_ms: i64,
    pub limit_mode: LimitMode,
    pub bucket_size_ms: i64,
    pub limit_type: LimitType,
    /// Extends the dedup key, e.g. with a request-specific identifier.
    pub name_extension: String,
    pub call_options: CallOptions,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            validation_mode: None,
            delay_ms: 0,
            limit_mode: LimitMode::Trailing,
            bucket_size_ms: DEFAULT_BUCKET_SIZE_MS,
            limit_type: LimitType::Throttle,
            name_extension: String::new(),
            call_options: CallOptions::default(),
        }
    }
}

impl SubmitOptions {
    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = Some(mode);
        self
    }

    pub fn with_delay_ms(mut self, delay_ms: i64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_limit_mode(mut self, limit_mode: LimitMode) -> Self {
        self.limit_mode = limit_mode;
        self
    }

    pub fn with_bucket_size_ms(mut self, bucket_size_ms: i64) -> Self {
        self.bucket_size_ms = bucket_size_ms;
        self
    }

    pub fn with_limit_type(mut self, limit_type: LimitType) -> Self {
        self.limit_type = limit_type;
        self
    }

    pub fn with_name_extension(mut self, extension: impl Into<String>) -> Self {
        self.name_extension = extension.into();
        self
    }

    pub fn with_call_options(mut self, call_options: CallOptions) -> Self {
        self.call_options = call_options;
        self
    }
}

/// Structured outcome of `submit`.
///
/// `ok == false` only for validation failures and non-conflict backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub ok: bool,
    pub created_new_task: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionResult {
    pub fn created() -> Self {
        Self {
            ok: true,
            created_new_task: true,
            error: None,
        }
    }

    /// Already scheduled, locally or remotely.
    pub fn deduplicated() -> Self {
        Self {
            ok: true,
            created_new_task: false,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            created_new_task: false,
            error: Some(error.into()),
        }
    }
}
