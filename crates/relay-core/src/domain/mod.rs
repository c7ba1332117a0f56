//! Domain model (call descriptors, requests, schedule, names, submissions, errors).
//!
//! - 純粋な値型と純粋関数のみ（I/O なし）
//! - schedule / task_name はテスト容易性のため副作用なし

pub mod call;
pub mod errors;
pub mod ids;
pub mod request;
pub mod schedule;
pub mod submission;
pub mod task_name;

pub use call::{CallDescriptor, CallSchemas, EncodingKind, HttpMethod, RoutingClass};
pub use errors::{
    BackendError, BackendErrorKind, ConfigurationError, MaterializeError, MissingParameterError,
    ValidationError,
};
pub use ids::RequestId;
pub use request::{MaterializedRequest, RequestPart, TypedRequest};
pub use schedule::{LimitMode, ScheduleTime, compute_schedule_time_ms};
pub use submission::{
    AuthPrincipal, CallOptions, DEFAULT_BUCKET_SIZE_MS, HttpDispatch, QueueLocator,
    QueueSubmission, SubmissionResult, SubmitOptions, TaskHandle,
};
pub use task_name::{LimitType, TaskName, normalize};
