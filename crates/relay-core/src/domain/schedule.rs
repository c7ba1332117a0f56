//! Schedule - 実行時刻のバケット量子化
//!
//! 同じバケット・同じモードの呼び出しは必ず同じ時刻になります。
//! この「同じ時刻」が task name の重複排除キーの元になります。

use serde::{Deserialize, Serialize};

const MILLIS_PER_SEC: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// Which edge of the bucket the call is snapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitMode {
    /// Start of the current bucket (debounce, leading edge).
    Leading,
    /// End of the current bucket; a burst executes together at the boundary.
    #[default]
    Trailing,
}

/// Compute the absolute schedule instant in epoch milliseconds.
///
/// `bucket_size_ms <= 0` disables bucketing and returns `now_ms + delay_ms`.
/// Results past the `i64` range saturate.
pub fn compute_schedule_time_ms(
    now_ms: i64,
    delay_ms: i64,
    limit_mode: LimitMode,
    bucket_size_ms: i64,
) -> i64 {
    let effective = now_ms.saturating_add(delay_ms);
    if bucket_size_ms <= 0 {
        return effective;
    }

    let floor = effective
        .div_euclid(bucket_size_ms)
        .saturating_mul(bucket_size_ms);
    match limit_mode {
        LimitMode::Leading => floor,
        LimitMode::Trailing => {
            if floor == effective {
                floor
            } else {
                floor.saturating_add(bucket_size_ms)
            }
        }
    }
}

/// Absolute instant in epoch milliseconds, with the (seconds, nanos) wire pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleTime {
    epoch_ms: i64,
}

impl ScheduleTime {
    pub fn from_epoch_ms(epoch_ms: i64) -> Self {
        Self { epoch_ms }
    }

    /// `Some` only when the instant is strictly after `now_ms`.
    /// Otherwise the backend default (as soon as possible) applies.
    pub fn future_only(epoch_ms: i64, now_ms: i64) -> Option<Self> {
        (epoch_ms > now_ms).then(|| Self::from_epoch_ms(epoch_ms))
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    pub fn seconds(&self) -> i64 {
        self.epoch_ms.div_euclid(MILLIS_PER_SEC)
    }

    pub fn nanos(&self) -> i32 {
        // always < 1e9
        (self.epoch_ms.rem_euclid(MILLIS_PER_SEC) * NANOS_PER_MILLI) as i32
    }
}
