//! In-memory engine for tests.
//!
//! Implements the same contract as the Redis engine with one async mutex in
//! place of server-side scripting: every method holds the lock for its whole
//! body, so single operations are indivisible and the pair variants cover
//! both keys in one critical section. Presence of a key in the map is the
//! "built" marker, so a built-but-empty structure is just an empty entry.

use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    engine::{RankingEngine, ScoreEntry},
    error::EngineError,
};

#[derive(Default)]
pub struct MemoryEngine {
    structures: Mutex<HashMap<String, HashMap<String, f64>>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn set_in(
    structures: &mut HashMap<String, HashMap<String, f64>>,
    key: &str,
    member: &str,
    score: f64,
) -> bool {
    match structures.get_mut(key) {
        Some(members) => {
            members.insert(member.to_string(), score);
            true
        }
        None => false,
    }
}

fn replace_in(
    structures: &mut HashMap<String, HashMap<String, f64>>,
    key: &str,
    entries: &[ScoreEntry],
) {
    let members = entries
        .iter()
        .map(|entry| (entry.user_id.clone(), entry.score))
        .collect();

    structures.insert(key.to_string(), members);
}

#[async_trait]
impl RankingEngine for MemoryEngine {
    async fn set_if_built(&self, key: &str, member: &str, score: f64) -> Result<bool, EngineError> {
        let mut structures = self.structures.lock().await;

        Ok(set_in(&mut structures, key, member, score))
    }

    async fn set_pair_if_built(
        &self,
        first: &str,
        second: &str,
        member: &str,
        first_score: f64,
        second_score: f64,
    ) -> Result<(bool, bool), EngineError> {
        let mut structures = self.structures.lock().await;

        let first_applied = set_in(&mut structures, first, member, first_score);
        let second_applied = set_in(&mut structures, second, member, second_score);

        Ok((first_applied, second_applied))
    }

    async fn replace(&self, key: &str, entries: &[ScoreEntry]) -> Result<(), EngineError> {
        let mut structures = self.structures.lock().await;

        replace_in(&mut structures, key, entries);

        Ok(())
    }

    async fn replace_pair(
        &self,
        first: &str,
        first_entries: &[ScoreEntry],
        second: &str,
        second_entries: &[ScoreEntry],
    ) -> Result<(), EngineError> {
        let mut structures = self.structures.lock().await;

        replace_in(&mut structures, first, first_entries);
        replace_in(&mut structures, second, second_entries);

        Ok(())
    }

    async fn built(&self, key: &str) -> Result<bool, EngineError> {
        let structures = self.structures.lock().await;

        Ok(structures.contains_key(key))
    }

    async fn top(&self, key: &str, limit: usize) -> Result<Vec<ScoreEntry>, EngineError> {
        let structures = self.structures.lock().await;

        let mut entries: Vec<ScoreEntry> = structures
            .get(key)
            .into_iter()
            .flatten()
            .map(|(user_id, score)| ScoreEntry::new(user_id.clone(), *score))
            .collect();

        // Same tie order as ZREVRANGE: score descending, member descending.
        entries.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.user_id.cmp(&a.user_id))
        });
        entries.truncate(limit);

        Ok(entries)
    }
}
