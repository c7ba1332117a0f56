//! TracingObserver - lifecycle hook を tracing のイベントとして出力

use tracing::{info, warn};

use crate::domain::{CallDescriptor, RequestId, RequestPart, TaskHandle, TypedRequest};
use crate::ports::{SubmissionObserver, ValidationIssue};

/// Logs every lifecycle notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SubmissionObserver for TracingObserver {
    fn on_will_submit(&self, call: &CallDescriptor, _request: &TypedRequest, request_id: RequestId) {
        info!(
            call = call.name(),
            method = call.method().as_str(),
            routing_class = call.routing_class().as_str(),
            %request_id,
            "submitting task"
        );
    }

    fn on_did_submit(
        &self,
        call: &CallDescriptor,
        _request: &TypedRequest,
        request_id: RequestId,
        task: &TaskHandle,
    ) {
        info!(
            call = call.name(),
            %request_id,
            task = %task.name,
            schedule_ms = task.schedule_time.map(|t| t.epoch_ms()),
            "task submitted"
        );
    }

    fn on_validation_error(
        &self,
        call: &CallDescriptor,
        _request: &TypedRequest,
        part: RequestPart,
        issue: &ValidationIssue,
    ) {
        warn!(
            call = call.name(),
            %part,
            path = issue.path.as_deref(),
            message = %issue.message,
            "request validation issue"
        );
    }
}
