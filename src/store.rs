//! # Ranking store
//!
//! The four operations the rest of the platform calls:
//!
//! - Contest command handlers push a user's recomputed absolute score after
//!   each durable score-affecting event (new, deleted, detached or corrected
//!   log); official events touch the yearly and global leaderboards in one
//!   atomic call.
//! - The reconciliation job rebuilds whole leaderboards from the relational
//!   aggregate, again atomically, official pairs in one call.
//!
//! Holds no state beyond the injected engine handle, so any number of
//! request handlers can call it concurrently.

use std::time::Duration;

use tracing::debug;

use crate::{
    address::Address,
    config::Config,
    database::RedisEngine,
    engine::{RankingEngine, ScoreEntry},
    error::{EngineError, StoreError},
};

pub struct RankingStore<E> {
    engine: E,
    namespace: String,
}

impl RankingStore<RedisEngine> {
    pub async fn connect(config: &Config) -> Result<Self, EngineError> {
        let engine = RedisEngine::connect(
            &config.redis_url,
            Duration::from_millis(config.connect_timeout_ms),
        )
        .await?;

        Ok(Self::new(engine, config.namespace.clone()))
    }
}

impl<E: RankingEngine> RankingStore<E> {
    pub fn new(engine: E, namespace: impl Into<String>) -> Self {
        Self {
            engine,
            namespace: namespace.into(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Sets `user_id`'s absolute score on a contest leaderboard.
    ///
    /// Returns `false` without side effect if that leaderboard was never
    /// built; only a rebuild may bring it into existence.
    pub async fn update_contest_score(
        &self,
        contest_id: &str,
        user_id: &str,
        score: f64,
    ) -> Result<bool, StoreError> {
        let address = Address::contest(contest_id);
        let key = address.key(&self.namespace);

        let applied = self
            .engine
            .set_if_built(&key, user_id, score)
            .await
            .map_err(StoreError::engine("update contest score", key.clone()))?;

        debug!(%address, user_id, score, applied, "conditional score update");

        Ok(applied)
    }

    /// Sets `user_id`'s absolute scores on the yearly and global official
    /// leaderboards in one atomic operation.
    ///
    /// Each existence gate is evaluated on its own: right after a year
    /// boundary the global leaderboard may accept the write while the new
    /// year's does not yet exist.
    pub async fn update_official_scores(
        &self,
        year: u16,
        user_id: &str,
        yearly_score: f64,
        global_score: f64,
    ) -> Result<(bool, bool), StoreError> {
        let yearly_key = Address::Yearly(year).key(&self.namespace);
        let global_key = Address::Global.key(&self.namespace);

        let (yearly_applied, global_applied) = self
            .engine
            .set_pair_if_built(&yearly_key, &global_key, user_id, yearly_score, global_score)
            .await
            .map_err(StoreError::engine(
                "update official scores",
                format!("{yearly_key} and {global_key}"),
            ))?;

        debug!(
            year,
            user_id,
            yearly_score,
            global_score,
            yearly_applied,
            global_applied,
            "conditional official score update"
        );

        Ok((yearly_applied, global_applied))
    }

    /// Atomically replaces a contest leaderboard with the given snapshot.
    ///
    /// Establishes the leaderboard if it never existed; an empty snapshot is
    /// legal and leaves it built but empty. Readers see the full old content
    /// or the full new content, nothing in between.
    pub async fn rebuild_contest_leaderboard(
        &self,
        contest_id: &str,
        entries: &[ScoreEntry],
    ) -> Result<(), StoreError> {
        let address = Address::contest(contest_id);
        let key = address.key(&self.namespace);

        self.engine
            .replace(&key, entries)
            .await
            .map_err(StoreError::engine("rebuild contest leaderboard", key.clone()))?;

        debug!(%address, entries = entries.len(), "leaderboard rebuilt");

        Ok(())
    }

    /// Atomically replaces the yearly and global official leaderboards with
    /// snapshots from the same computation, so no reader can compare a yearly
    /// rank against a global rank from different generations.
    pub async fn rebuild_official_leaderboards(
        &self,
        year: u16,
        yearly_entries: &[ScoreEntry],
        global_entries: &[ScoreEntry],
    ) -> Result<(), StoreError> {
        let yearly_key = Address::Yearly(year).key(&self.namespace);
        let global_key = Address::Global.key(&self.namespace);

        self.engine
            .replace_pair(&yearly_key, yearly_entries, &global_key, global_entries)
            .await
            .map_err(StoreError::engine(
                "rebuild official leaderboards",
                format!("{yearly_key} and {global_key}"),
            ))?;

        debug!(
            year,
            yearly_entries = yearly_entries.len(),
            global_entries = global_entries.len(),
            "official leaderboards rebuilt"
        );

        Ok(())
    }
}
