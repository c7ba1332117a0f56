//! SubmissionObserver port - ライフサイクル hook
//!
//! グローバルな setter ではなく、submitter の構築時に注入します。
//! すべて同期・副作用のみの通知で、submit の結果を変えることはできません。

use crate::domain::{CallDescriptor, RequestId, RequestPart, TaskHandle, TypedRequest};
use crate::ports::ValidationIssue;

/// Lifecycle notifications. Every method defaults to a no-op.
pub trait SubmissionObserver: Send + Sync {
    /// Called right before the backend call.
    fn on_will_submit(&self, _call: &CallDescriptor, _request: &TypedRequest, _request_id: RequestId) {}

    /// Called after the backend created a new task.
    fn on_did_submit(
        &self,
        _call: &CallDescriptor,
        _request: &TypedRequest,
        _request_id: RequestId,
        _task: &TaskHandle,
    ) {
    }

    /// Called for soft issues and hard failures alike.
    fn on_validation_error(
        &self,
        _call: &CallDescriptor,
        _request: &TypedRequest,
        _part: RequestPart,
        _issue: &ValidationIssue,
    ) {
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SubmissionObserver for NoopObserver {}
