use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::future::join_all;
use tempfile::TempDir;

use contribscore::cache::{CacheKey, CacheSource, EvaluationCache};
use contribscore::error::ScoreError;
use contribscore::store::StoreLayout;

use super::score_harness::{evaluation, repo};

#[tokio::test]
async fn concurrent_misses_compute_once() {
    let tmp = TempDir::new().unwrap();
    let cache = EvaluationCache::new(StoreLayout::under(tmp.path()));
    let key = CacheKey::new(repo("api"), "Ann", "zgc_simple");
    let computed = AtomicUsize::new(0);

    let requests = (0..8).map(|_| {
        cache.get_or_compute(&key, true, || async {
            computed.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(evaluation("ann", "zgc_simple", 70.0))
        })
    });
    let outcomes = join_all(requests).await;

    assert_eq!(computed.load(Ordering::SeqCst), 1);
    let sources: Vec<CacheSource> = outcomes
        .into_iter()
        .map(|outcome| outcome.unwrap().source)
        .collect();
    assert_eq!(
        sources.iter().filter(|s| **s == CacheSource::Computed).count(),
        1
    );
}

#[tokio::test]
async fn waiting_requests_join_even_without_cache_reuse() {
    let tmp = TempDir::new().unwrap();
    let cache = EvaluationCache::new(StoreLayout::under(tmp.path()));
    let key = CacheKey::new(repo("api"), "ann", "zgc_simple");
    let computed = AtomicUsize::new(0);

    let requests = (0..4).map(|_| {
        cache.get_or_compute(&key, false, || async {
            computed.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(evaluation("ann", "zgc_simple", 55.0))
        })
    });
    let outcomes = join_all(requests).await;

    assert_eq!(computed.load(Ordering::SeqCst), 1);
    let joined = outcomes
        .iter()
        .filter(|o| o.as_ref().is_ok_and(|o| o.source == CacheSource::Joined))
        .count();
    assert_eq!(joined, 3);

    // A later request with caching off recomputes.
    cache
        .get_or_compute(&key, false, || async {
            computed.fetch_add(1, Ordering::SeqCst);
            Ok(evaluation("ann", "zgc_simple", 56.0))
        })
        .await
        .unwrap();
    assert_eq!(computed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn queued_requests_share_a_failed_computation() {
    let tmp = TempDir::new().unwrap();
    let cache = EvaluationCache::new(StoreLayout::under(tmp.path()));
    let key = CacheKey::new(repo("api"), "ann", "zgc_simple");
    let computed = AtomicUsize::new(0);

    let requests = (0..6).map(|_| {
        cache.get_or_compute(&key, true, || async {
            computed.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err(ScoreError::Timeout {
                after: Duration::from_millis(30),
            })
        })
    });
    let outcomes = join_all(requests).await;

    assert_eq!(computed.load(Ordering::SeqCst), 1);
    for outcome in &outcomes {
        let err = outcome.as_ref().unwrap_err();
        assert!(err.reason().contains("timed out after 30ms"));
        assert!(err.is_retryable());
    }
    assert!(!cache.path_for(&key).exists());

    // The failure is not remembered for requests that arrive afterwards.
    let outcome = cache
        .get_or_compute(&key, true, || async {
            computed.fetch_add(1, Ordering::SeqCst);
            Ok(evaluation("ann", "zgc_simple", 61.0))
        })
        .await
        .unwrap();
    assert_eq!(outcome.source, CacheSource::Computed);
    assert_eq!(computed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn plugins_never_share_entries() {
    let tmp = TempDir::new().unwrap();
    let cache = EvaluationCache::new(StoreLayout::under(tmp.path()));
    let simple = CacheKey::new(repo("api"), "ann", "zgc_simple");
    let ai = CacheKey::new(repo("api"), "ann", "zgc_ai");

    cache
        .put(&simple, evaluation("ann", "zgc_simple", 40.0))
        .unwrap();
    assert!(cache.get(&ai).is_none());

    cache.put(&ai, evaluation("ann", "zgc_ai", 90.0)).unwrap();
    assert_ne!(cache.path_for(&simple), cache.path_for(&ai));

    assert!(cache.remove(&simple).unwrap());
    assert!(cache.get(&simple).is_none());
    assert_eq!(cache.get(&ai).unwrap().result.scores.leadership, 90.0);
}

#[tokio::test]
async fn corrupted_entry_is_a_miss_and_gets_overwritten() {
    let tmp = TempDir::new().unwrap();
    let cache = EvaluationCache::new(StoreLayout::under(tmp.path()));
    let key = CacheKey::new(repo("api"), "ann", "zgc_simple");
    let path = cache.path_for(&key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{ not json").unwrap();

    assert!(cache.read(&key).is_err());
    let outcome = cache
        .get_or_compute(&key, true, || async {
            Ok(evaluation("ann", "zgc_simple", 33.0))
        })
        .await
        .unwrap();
    assert_eq!(outcome.source, CacheSource::Computed);
    assert_eq!(cache.read(&key).unwrap().unwrap().result.scores.open_source, 33.0);
}
