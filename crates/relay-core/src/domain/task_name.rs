//! TaskName - 冪等な task name（重複排除キー）
//!
//! `normalize(call.name + "-" + extension) + "-" + schedule_time_ms`
//!
//! schedule time がバケット量子化されているので、同じ call / extension / バケットの
//! 呼び出しは同じ name になります。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::call::CallDescriptor;

/// Whether bursts are coalesced at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitType {
    #[default]
    Throttle,
    /// Every call gets a backend-assigned identity; no dedup.
    None,
}

/// Replace every run of characters outside `[A-Za-z0-9_]` with a single `-`.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Short task id, unique within one queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskName(String);

impl TaskName {
    /// `None` when limiting is disabled (`LimitType::None` or a non-positive bucket).
    pub fn for_call(
        call: &CallDescriptor,
        limit_type: LimitType,
        bucket_size_ms: i64,
        extension: &str,
        schedule_time_ms: i64,
    ) -> Option<Self> {
        if limit_type == LimitType::None || bucket_size_ms <= 0 {
            return None;
        }
        let base = normalize(&format!("{}-{}", call.name(), extension));
        Some(Self(format!("{base}-{schedule_time_ms}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
