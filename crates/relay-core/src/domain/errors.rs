//! Errors - エラー型と分類
//!
//! # 伝播ポリシー
//! - `ConfigurationError` だけが `Err` として submit から外に出る（プログラミング/設定ミス）
//! - それ以外は `SubmissionResult { ok: false, .. }` に変換される
//! - backend の "already exists" は成功として扱う

use thiserror::Error;

use super::call::{EncodingKind, HttpMethod};
use super::request::RequestPart;

/// Programmer or configuration mistake. Raised before any network attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{0} isn't supported for deferred task submission")]
    UnsupportedMethod(HttpMethod),

    #[error("{0} request encoding isn't supported for deferred task submission")]
    UnsupportedEncoding(EncodingKind),
}

/// Hard schema validation failure on one request part.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Request {part} validation error: {message}")]
pub struct ValidationError {
    pub part: RequestPart,
    pub message: String,
}

/// A `{marker}` in the URL template had no matching param.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing param value for {param_name}")]
pub struct MissingParameterError {
    pub param_name: String,
}

/// Anything that can stop materialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    MissingParameter(#[from] MissingParameterError),

    #[error("body encoding failed: {0}")]
    Encoding(String),
}

/// Classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// A task with the requested name already exists (idempotent conflict).
    AlreadyExists,
    /// Transient: network, quota, deadline.
    Unavailable,
    Other,
}

/// Failure reported by the task backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    kind: BackendErrorKind,
    message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::AlreadyExists, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unavailable, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == BackendErrorKind::AlreadyExists
    }
}
