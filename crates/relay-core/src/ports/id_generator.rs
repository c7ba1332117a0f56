//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（本番用）

use crate::domain::RequestId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は submit 試行ごとの RequestId を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数の submit から同時に使われる）
pub trait IdGenerator: Send + Sync {
    fn generate_request_id(&self) -> RequestId;
}

/// Clock の現在時刻を timestamp 部に使う ULID 生成器
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_request_id(&self) -> RequestId {
        let timestamp_ms = self.clock.now_ms().max(0) as u64;
        RequestId::from(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
