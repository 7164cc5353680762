//! # Leaderboard Ranking Store
//!
//! Read-optimized ranking structures for reading-contest leaderboards, kept in
//! Redis sorted sets as a derived cache over the relational source of truth.
//!
//! ## Requirements
//!
//! - Serve leaderboards in descending score order without touching the
//!   relational store on the read path
//! - Absolute score writes, never increments: callers recompute a user's total
//!   and hand it over
//! - Three categories sharing one Redis instance: per-contest, yearly official,
//!   global official
//! - Atomic operations only; a reader must never see a half-applied update or
//!   a half-rebuilt leaderboard
//!
//! ## Implementation
//!
//! - One sorted set per leaderboard, member = user id, score = recomputed total
//! - A companion marker key per set records that the leaderboard was built;
//!   an empty sorted set and a missing one look identical to Redis, the marker
//!   keeps "built but empty" and "never built" apart
//! - Conditional updates are gated on the marker: a single-member write carries
//!   no information about the rest of the leaderboard, so it must not bring an
//!   unbuilt structure into existence
//! - Every multi-step operation runs as one server-side Lua script, so
//!   check-and-write and delete-and-refill are indivisible without any
//!   client-side locking
//! - Official (yearly + global) writes span both sets in one script, so both
//!   always reflect the same computation generation
//!
//! ## Syncing
//!
//! Redis is never authoritative here. Command handlers push absolute scores
//! after each durable event, and a periodic job rebuilds whole leaderboards
//! from the relational aggregate. A conditional update racing a rebuild that
//! was computed from an older snapshot can be overwritten by it; the next
//! rebuild corrects any drift. Eventual consistency is the accepted tradeoff.

pub mod address;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod memory;
pub mod store;

pub use address::Address;
pub use config::Config;
pub use database::RedisEngine;
pub use engine::{RankingEngine, ScoreEntry};
pub use error::{EngineError, StoreError};
pub use memory::MemoryEngine;
pub use store::RankingStore;
