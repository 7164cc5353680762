//! Backing-engine abstraction.
//!
//! The store only ever needs a handful of atomic primitives from its ordered
//! store, so they sit behind one narrow trait. Production wires in
//! [`RedisEngine`](crate::database::RedisEngine); tests substitute
//! [`MemoryEngine`](crate::memory::MemoryEngine) without touching any global
//! state. Implementations must keep each method indivisible with respect to
//! every other call on the same key, and the pair variants indivisible across
//! both keys.

use async_trait::async_trait;

use crate::error::EngineError;

/// One member's absolute score, as fed to a rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub user_id: String,
    pub score: f64,
}

impl ScoreEntry {
    pub fn new(user_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            score,
        }
    }
}

#[async_trait]
pub trait RankingEngine: Send + Sync {
    /// Sets `member`'s score in `key`, but only if `key` was already built.
    ///
    /// Returns whether the write was applied. Must never bring an unbuilt
    /// structure into existence, and the check and the write must be one
    /// indivisible step.
    async fn set_if_built(&self, key: &str, member: &str, score: f64) -> Result<bool, EngineError>;

    /// [`set_if_built`](Self::set_if_built) across two keys as one atomic
    /// operation, each gate evaluated independently.
    async fn set_pair_if_built(
        &self,
        first: &str,
        second: &str,
        member: &str,
        first_score: f64,
        second_score: f64,
    ) -> Result<(bool, bool), EngineError>;

    /// Atomically discards all content of `key` and refills it with exactly
    /// `entries`, marking the structure built. An empty slice leaves a built,
    /// empty structure.
    async fn replace(&self, key: &str, entries: &[ScoreEntry]) -> Result<(), EngineError>;

    /// [`replace`](Self::replace) across two keys as one atomic operation:
    /// readers see both old contents or both new, never a mix.
    async fn replace_pair(
        &self,
        first: &str,
        first_entries: &[ScoreEntry],
        second: &str,
        second_entries: &[ScoreEntry],
    ) -> Result<(), EngineError>;

    /// Whether `key` has ever been built. Built-but-empty reports `true`.
    async fn built(&self, key: &str) -> Result<bool, EngineError>;

    /// Up to `limit` entries in descending score order; equal scores order by
    /// descending member id.
    async fn top(&self, key: &str, limit: usize) -> Result<Vec<ScoreEntry>, EngineError>;
}
