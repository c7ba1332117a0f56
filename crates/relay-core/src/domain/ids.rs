//! Request identifiers.
//!
//! 1 回の submit 試行ごとに新しい RequestId を発行します（ULID ベース）。
//! hook の on_will_submit / on_did_submit を突き合わせるために使います。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier minted per submission attempt.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Ulid);

impl RequestId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for RequestId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_prefix() {
        let id = RequestId::from_ulid(Ulid::new());
        assert!(id.to_string().starts_with("req-"));
    }

    #[test]
    fn serializes_as_plain_ulid() {
        let ulid = Ulid::new();
        let id: RequestId = ulid.into();
        let s = serde_json::to_string(&id).unwrap();
        let back: RequestId = serde_json::from_str(&s).unwrap();
        assert_eq!(back.as_ulid(), ulid);
    }
}
