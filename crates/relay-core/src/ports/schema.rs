//! RequestSchema port - 型付き request の検証とシリアライズ
//!
//! schema ライブラリ本体は外部コラボレータです。core は trait 境界だけを知っています。
//!
//! # 契約
//! - `serialize` は 1 つの request part を受け取り、シリアライズ済みの値と
//!   （あれば）検証エラーを返す
//! - soft / hard の区別は呼び出し側の `ValidationMode` で決まる

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How strictly schema issues are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Skip the validation check entirely.
    None,
    /// Report issues through the observer and continue.
    Soft,
    /// Report issues and abort the submission.
    #[default]
    Hard,
}

/// One schema issue found while serializing a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub message: String,
    /// Location inside the part, e.g. `user.id`.
    pub path: Option<String>,
}

impl ValidationIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
        }
    }

    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Output of serializing one request part.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedPart {
    /// `None` means the part is absent (e.g. no body).
    pub value: Option<serde_json::Value>,
    pub issue: Option<ValidationIssue>,
}

impl SerializedPart {
    pub fn valid(value: Option<serde_json::Value>) -> Self {
        Self { value, issue: None }
    }

    pub fn invalid(value: Option<serde_json::Value>, issue: ValidationIssue) -> Self {
        Self {
            value,
            issue: Some(issue),
        }
    }
}

/// Serializer/validator for one request part.
#[async_trait]
pub trait RequestSchema: Send + Sync {
    async fn serialize(
        &self,
        value: Option<&serde_json::Value>,
        mode: ValidationMode,
    ) -> SerializedPart;
}

/// Fallback used when a call declares no schema for a part: passes the value through.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveSchema;

#[async_trait]
impl RequestSchema for PermissiveSchema {
    async fn serialize(
        &self,
        value: Option<&serde_json::Value>,
        _mode: ValidationMode,
    ) -> SerializedPart {
        SerializedPart::valid(value.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn permissive_schema_passes_value_through() {
        let v = json!({ "a": 1 });
        let out = PermissiveSchema.serialize(Some(&v), ValidationMode::Hard).await;
        assert_eq!(out, SerializedPart::valid(Some(v)));

        let out = PermissiveSchema.serialize(None, ValidationMode::Hard).await;
        assert_eq!(out.value, None);
        assert!(out.issue.is_none());
    }

    #[test]
    fn validation_mode_defaults_to_hard() {
        assert_eq!(ValidationMode::default(), ValidationMode::Hard);
        let m: ValidationMode = serde_json::from_str("\"soft\"").unwrap();
        assert_eq!(m, ValidationMode::Soft);
    }
}
