//! # Redis engine
//!
//! Sorted-set implementation of [`RankingEngine`].
//!
//! ## Layout
//!
//! - One sorted set per leaderboard: member = user id, score = absolute total
//! - One marker string per leaderboard (`<key>:built`): Redis drops a sorted
//!   set the moment it becomes empty, so set existence cannot distinguish
//!   "built but empty" from "never built". The marker can. Every script that
//!   touches a set touches its marker in the same atomic step, so the two
//!   never diverge.
//!
//! ## Atomicity
//!
//! Each operation is one Lua script. Redis runs a script to completion before
//! anything else executes, which gives us check-and-write and
//! delete-and-refill as single indivisible steps with no client-side locks.
//! The official-pair scripts cover both sorted sets in one script for the
//! same reason.
//!
//! Cancelling a call mid-flight only abandons the response: the script may
//! already have run on the server, so a cancelled call means "effect
//! unknown", never "no effect".

use std::time::Duration;

use async_trait::async_trait;
use redis::{
    Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::{
    engine::{RankingEngine, ScoreEntry},
    error::EngineError,
};

const BUILT_SUFFIX: &str = ":built";

/// KEYS: set, marker. ARGV: member, score.
const SET_IF_BUILT: &str = r#"
    if redis.call('EXISTS', KEYS[2]) == 0 then
        return 0
    end
    redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
    return 1
"#;

/// KEYS: first set, first marker, second set, second marker.
/// ARGV: member, first score, second score.
const SET_PAIR_IF_BUILT: &str = r#"
    local applied = {0, 0}
    if redis.call('EXISTS', KEYS[2]) == 1 then
        redis.call('ZADD', KEYS[1], ARGV[2], ARGV[1])
        applied[1] = 1
    end
    if redis.call('EXISTS', KEYS[4]) == 1 then
        redis.call('ZADD', KEYS[3], ARGV[3], ARGV[1])
        applied[2] = 1
    end
    return applied
"#;

/// KEYS: set, marker. ARGV: score, member, repeating.
const REPLACE: &str = r#"
    redis.call('DEL', KEYS[1])
    for i = 1, #ARGV, 2 do
        redis.call('ZADD', KEYS[1], ARGV[i], ARGV[i + 1])
    end
    redis.call('SET', KEYS[2], 1)
    return redis.status_reply('OK')
"#;

/// KEYS: first set, first marker, second set, second marker.
/// ARGV: count of slots belonging to the first set, then score, member,
/// repeating, first set's entries before the second's.
const REPLACE_PAIR: &str = r#"
    local split = tonumber(ARGV[1])
    redis.call('DEL', KEYS[1])
    for i = 2, split + 1, 2 do
        redis.call('ZADD', KEYS[1], ARGV[i], ARGV[i + 1])
    end
    redis.call('SET', KEYS[2], 1)
    redis.call('DEL', KEYS[3])
    for i = split + 2, #ARGV, 2 do
        redis.call('ZADD', KEYS[3], ARGV[i], ARGV[i + 1])
    end
    redis.call('SET', KEYS[4], 1)
    return redis.status_reply('OK')
"#;

pub struct RedisEngine {
    connection: ConnectionManager,
    set_if_built: Script,
    set_pair_if_built: Script,
    replace: Script,
    replace_pair: Script,
}

impl RedisEngine {
    pub async fn connect(redis_url: &str, connect_timeout: Duration) -> Result<Self, EngineError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(connect_timeout);

        let client = Client::open(redis_url)?;
        let connection = client
            .get_connection_manager_with_config(config)
            .await?;

        Ok(Self::with_connection(connection))
    }

    pub fn with_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            set_if_built: Script::new(SET_IF_BUILT),
            set_pair_if_built: Script::new(SET_PAIR_IF_BUILT),
            replace: Script::new(REPLACE),
            replace_pair: Script::new(REPLACE_PAIR),
        }
    }
}

fn marker_key(key: &str) -> String {
    format!("{key}{BUILT_SUFFIX}")
}

/// Inclusive ZREVRANGE stop for a requested limit; saturates instead of
/// wrapping for limits beyond the engine's index range.
fn stop_index(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX).saturating_sub(1)
}

#[async_trait]
impl RankingEngine for RedisEngine {
    async fn set_if_built(&self, key: &str, member: &str, score: f64) -> Result<bool, EngineError> {
        let mut connection = self.connection.clone();

        let applied: i64 = self
            .set_if_built
            .key(key)
            .key(marker_key(key))
            .arg(member)
            .arg(score)
            .invoke_async(&mut connection)
            .await?;

        Ok(applied == 1)
    }

    async fn set_pair_if_built(
        &self,
        first: &str,
        second: &str,
        member: &str,
        first_score: f64,
        second_score: f64,
    ) -> Result<(bool, bool), EngineError> {
        let mut connection = self.connection.clone();

        let (first_applied, second_applied): (i64, i64) = self
            .set_pair_if_built
            .key(first)
            .key(marker_key(first))
            .key(second)
            .key(marker_key(second))
            .arg(member)
            .arg(first_score)
            .arg(second_score)
            .invoke_async(&mut connection)
            .await?;

        Ok((first_applied == 1, second_applied == 1))
    }

    async fn replace(&self, key: &str, entries: &[ScoreEntry]) -> Result<(), EngineError> {
        let mut connection = self.connection.clone();

        let mut invocation = self.replace.prepare_invoke();
        invocation.key(key).key(marker_key(key));
        for entry in entries {
            invocation.arg(entry.score).arg(&entry.user_id);
        }

        let _: () = invocation.invoke_async(&mut connection).await?;

        Ok(())
    }

    async fn replace_pair(
        &self,
        first: &str,
        first_entries: &[ScoreEntry],
        second: &str,
        second_entries: &[ScoreEntry],
    ) -> Result<(), EngineError> {
        let mut connection = self.connection.clone();

        let mut invocation = self.replace_pair.prepare_invoke();
        invocation
            .key(first)
            .key(marker_key(first))
            .key(second)
            .key(marker_key(second))
            .arg(first_entries.len() * 2);
        for entry in first_entries.iter().chain(second_entries) {
            invocation.arg(entry.score).arg(&entry.user_id);
        }

        let _: () = invocation.invoke_async(&mut connection).await?;

        Ok(())
    }

    async fn built(&self, key: &str) -> Result<bool, EngineError> {
        let mut connection = self.connection.clone();

        let found: i64 = redis::cmd("EXISTS")
            .arg(marker_key(key))
            .query_async(&mut connection)
            .await?;

        Ok(found == 1)
    }

    async fn top(&self, key: &str, limit: usize) -> Result<Vec<ScoreEntry>, EngineError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut connection = self.connection.clone();

        let rows: Vec<(String, f64)> = redis::cmd("ZREVRANGE")
            .arg(key)
            .arg(0)
            .arg(stop_index(limit))
            .arg("WITHSCORES")
            .query_async(&mut connection)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, score)| ScoreEntry { user_id, score })
            .collect())
    }
}
