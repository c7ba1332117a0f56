//! DedupGuard - プロセス内の重複投入ガード
//!
//! # 学習ポイント
//! - check-and-insert を 1 回のロック内で行う（同じ name で競合した submit の
//!   どちらか一方だけが backend に到達する）
//! - ロックを保持したまま await しない
//! - 期限付きエントリ + 期限順インデックス（BTreeSet）で、メモリ使用量を
//!   「生きているバケット数」に抑える
//!
//! # トレードオフ
//! backend 呼び出し前に楽観的に予約するので、予約直後にプロセスが落ちると
//! リモートには何も作られない。ガードはメモリ上にしかないためプロセスと共に消え、
//! プロセス内で孤立した予約も期限切れで回収される。

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct GuardState {
    /// name -> expires_at_ms
    entries: HashMap<String, i64>,
    /// (expires_at_ms, name), earliest first.
    expiry_index: BTreeSet<(i64, String)>,
}

impl GuardState {
    /// Drop every entry whose expiry is at or before `now_ms`.
    fn sweep_expired(&mut self, now_ms: i64) {
        while let Some((expires_at, _)) = self.expiry_index.first() {
            if *expires_at > now_ms {
                break; // sorted, so nothing later has expired
            }
            if let Some((_, name)) = self.expiry_index.pop_first() {
                self.entries.remove(&name);
            }
        }
    }

    fn remove(&mut self, name: &str) -> bool {
        match self.entries.remove(name) {
            Some(expires_at) => {
                self.expiry_index.remove(&(expires_at, name.to_string()));
                true
            }
            None => false,
        }
    }
}

/// Set of task names believed to be in flight or already created.
#[derive(Debug, Default)]
pub struct DedupGuard {
    state: Mutex<GuardState>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        // the state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically reserve `name` until `expires_at_ms`.
    ///
    /// Returns `false` when a live reservation already exists.
    pub fn try_reserve(&self, name: &str, expires_at_ms: i64, now_ms: i64) -> bool {
        let mut state = self.lock();
        state.sweep_expired(now_ms);

        if state.entries.contains_key(name) {
            return false;
        }
        state.entries.insert(name.to_string(), expires_at_ms);
        state.expiry_index.insert((expires_at_ms, name.to_string()));
        true
    }

    /// Forget `name` so the next submission with the same key reaches the backend.
    pub fn release(&self, name: &str) -> bool {
        self.lock().remove(name)
    }

    /// The backend already has `name`; keep the reservation.
    pub fn confirm_conflict(&self, _name: &str) {}

    pub fn contains(&self, name: &str) -> bool {
        self.lock().entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
