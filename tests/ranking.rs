//! Ranking store behavior against the in-memory engine, which honors the same
//! atomicity contract as the Redis scripts.

use std::sync::Arc;

use leaderboard::{MemoryEngine, RankingEngine, RankingStore, ScoreEntry};
use tracing_subscriber::{EnvFilter, fmt};

fn store() -> RankingStore<MemoryEngine> {
    // Tests in one binary share the subscriber; later inits are no-ops.
    let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();

    RankingStore::new(MemoryEngine::new(), "test")
}

#[tokio::test]
async fn test_update_before_any_rebuild_is_rejected() {
    let store = store();

    let applied = store.update_contest_score("c2", "u1", 10.0).await.unwrap();

    assert!(!applied);
    // Still "never built", not "empty".
    assert!(!store.engine().built("test:contest:c2").await.unwrap());
}

#[tokio::test]
async fn test_empty_rebuild_opens_the_gate() {
    let store = store();

    store.rebuild_contest_leaderboard("c1", &[]).await.unwrap();
    let applied = store.update_contest_score("c1", "u1", 12.5).await.unwrap();

    assert!(applied);
    assert_eq!(
        store.engine().top("test:contest:c1", 10).await.unwrap(),
        vec![ScoreEntry::new("u1", 12.5)]
    );
}

#[tokio::test]
async fn test_rebuild_is_idempotent_in_content() {
    let store = store();
    let entries = vec![ScoreEntry::new("u1", 30.0), ScoreEntry::new("u2", 50.0)];

    store.rebuild_contest_leaderboard("c1", &entries).await.unwrap();
    let first = store.engine().top("test:contest:c1", 10).await.unwrap();

    store.rebuild_contest_leaderboard("c1", &entries).await.unwrap();
    let second = store.engine().top("test:contest:c1", 10).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rebuild_supersedes_prior_content() {
    let store = store();

    store
        .rebuild_contest_leaderboard(
            "c1",
            &[ScoreEntry::new("u1", 30.0), ScoreEntry::new("u2", 50.0)],
        )
        .await
        .unwrap();
    store
        .rebuild_contest_leaderboard("c1", &[ScoreEntry::new("u2", 55.0)])
        .await
        .unwrap();

    // u1 left the snapshot, so u1 left the leaderboard.
    assert_eq!(
        store.engine().top("test:contest:c1", 10).await.unwrap(),
        vec![ScoreEntry::new("u2", 55.0)]
    );
}

#[tokio::test]
async fn test_ranked_read_back_and_overtake() {
    let store = store();

    store
        .rebuild_contest_leaderboard(
            "c1",
            &[ScoreEntry::new("u1", 30.0), ScoreEntry::new("u2", 50.0)],
        )
        .await
        .unwrap();

    assert_eq!(
        store.engine().top("test:contest:c1", 2).await.unwrap(),
        vec![ScoreEntry::new("u2", 50.0), ScoreEntry::new("u1", 30.0)]
    );

    let applied = store.update_contest_score("c1", "u1", 80.0).await.unwrap();

    assert!(applied);
    assert_eq!(
        store.engine().top("test:contest:c1", 2).await.unwrap(),
        vec![ScoreEntry::new("u1", 80.0), ScoreEntry::new("u2", 50.0)]
    );
}

#[tokio::test]
async fn test_official_update_gates_evaluate_independently() {
    let store = store();

    // Only the global leaderboard has been built, e.g. right after a year
    // boundary before the first yearly rebuild.
    store
        .rebuild_official_leaderboards(2025, &[], &[ScoreEntry::new("u1", 100.0)])
        .await
        .unwrap();

    let (yearly_applied, global_applied) = store
        .update_official_scores(2026, "u1", 40.0, 140.0)
        .await
        .unwrap();

    assert!(!yearly_applied);
    assert!(global_applied);
    assert!(!store.engine().built("test:official:2026").await.unwrap());
    assert_eq!(
        store.engine().top("test:official:global", 10).await.unwrap(),
        vec![ScoreEntry::new("u1", 140.0)]
    );
}

#[tokio::test]
async fn test_official_update_applies_to_both_when_both_built() {
    let store = store();

    store
        .rebuild_official_leaderboards(2026, &[ScoreEntry::new("u1", 10.0)], &[ScoreEntry::new("u1", 90.0)])
        .await
        .unwrap();

    let (yearly_applied, global_applied) = store
        .update_official_scores(2026, "u1", 25.0, 105.0)
        .await
        .unwrap();

    assert!(yearly_applied);
    assert!(global_applied);
    assert_eq!(
        store.engine().top("test:official:2026", 10).await.unwrap(),
        vec![ScoreEntry::new("u1", 25.0)]
    );
    assert_eq!(
        store.engine().top("test:official:global", 10).await.unwrap(),
        vec![ScoreEntry::new("u1", 105.0)]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_all_land() {
    let store = Arc::new(store());
    store.rebuild_contest_leaderboard("c1", &[]).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            let user_id = format!("u{i:02}");
            assert!(store.update_contest_score("c1", &user_id, i as f64).await.unwrap());
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let entries = store.engine().top("test:contest:c1", 32).await.unwrap();
    assert_eq!(entries.len(), 16);
    assert_eq!(entries[0], ScoreEntry::new("u15", 15.0));
}

/// Rebuilds the official pair through increasing generations while a reader
/// interleaves. The generation seen on the global leaderboard must always sit
/// between two bracketing reads of the yearly one; a pair rebuild that applied
/// one side at a time would let the global side fall outside the bracket.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_official_rebuild_never_splits_generations() {
    const GENERATIONS: u32 = 300;

    let store = Arc::new(store());
    store
        .rebuild_official_leaderboards(2026, &[ScoreEntry::new("u1", 0.0)], &[ScoreEntry::new("u1", 0.0)])
        .await
        .unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for generation in 1..=GENERATIONS {
                let snapshot = [ScoreEntry::new("u1", generation as f64)];
                store
                    .rebuild_official_leaderboards(2026, &snapshot, &snapshot)
                    .await
                    .unwrap();
            }
        })
    };

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            loop {
                let before = generation_of(store.engine(), "test:official:2026").await;
                let global = generation_of(store.engine(), "test:official:global").await;
                let after = generation_of(store.engine(), "test:official:2026").await;

                assert!(
                    before <= global && global <= after,
                    "global generation {global} outside yearly bracket [{before}, {after}]"
                );

                if after == GENERATIONS {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}

/// Same bracket argument as the rebuild harness, but for conditional updates:
/// an official update that applied one side at a time would let a reader
/// catch the global leaderboard outside two bracketing yearly reads.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_official_updates_never_split_generations() {
    const GENERATIONS: u32 = 300;

    let store = Arc::new(store());
    store
        .rebuild_official_leaderboards(2026, &[ScoreEntry::new("u1", 0.0)], &[ScoreEntry::new("u1", 0.0)])
        .await
        .unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for generation in 1..=GENERATIONS {
                let (yearly_applied, global_applied) = store
                    .update_official_scores(2026, "u1", generation as f64, generation as f64)
                    .await
                    .unwrap();

                assert!(yearly_applied);
                assert!(global_applied);
            }
        })
    };

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            loop {
                let before = generation_of(store.engine(), "test:official:2026").await;
                let global = generation_of(store.engine(), "test:official:global").await;
                let after = generation_of(store.engine(), "test:official:2026").await;

                assert!(
                    before <= global && global <= after,
                    "global generation {global} outside yearly bracket [{before}, {after}]"
                );

                if after == GENERATIONS {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}

async fn generation_of(engine: &MemoryEngine, key: &str) -> u32 {
    let entries = engine.top(key, 1).await.unwrap();
    entries[0].score as u32
}
