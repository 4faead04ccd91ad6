use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::models::{ProbeResult, Status};
use crate::normalize::{normalize, NormalizeError};

/// Outcome of an add or remove: the canonical URL acted on and whether the
/// monitored list changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetChange {
    pub url: String,
    pub changed: bool,
}

/// What happened to a result handed to [`Store::upsert_result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// Stored; carries the status it replaced, if any.
    Stored { previous: Option<Status> },
    /// The URL is no longer monitored, so the result was dropped.
    Untracked,
}

#[derive(Default)]
struct StoreState {
    targets: Vec<String>,
    results: HashMap<String, ProbeResult>,
}

/// Monitored URLs in insertion order plus the latest result for each.
///
/// A single lock covers both so that removing a target and its result is one
/// step, and an upsert can never land for a URL that was just removed.
#[derive(Default)]
pub struct Store {
    state: Mutex<StoreState>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list_targets(&self) -> Vec<String> {
        self.state.lock().await.targets.clone()
    }

    /// Latest results in monitored-list order; targets not yet probed are
    /// left out.
    pub async fn snapshot(&self) -> Vec<ProbeResult> {
        let state = self.state.lock().await;
        state
            .targets
            .iter()
            .filter_map(|url| state.results.get(url).cloned())
            .collect()
    }

    pub async fn add_target(&self, raw: &str) -> Result<TargetChange, NormalizeError> {
        let url = normalize(raw)?;
        let mut state = self.state.lock().await;
        let changed = !state.targets.contains(&url);
        if changed {
            state.targets.push(url.clone());
        }
        Ok(TargetChange { url, changed })
    }

    pub async fn remove_target(&self, raw: &str) -> Result<TargetChange, NormalizeError> {
        let url = normalize(raw)?;
        let mut state = self.state.lock().await;
        let before = state.targets.len();
        state.targets.retain(|u| u != &url);
        state.results.remove(&url);
        let changed = state.targets.len() != before;
        Ok(TargetChange { url, changed })
    }

    pub async fn upsert_result(&self, result: ProbeResult) -> Upsert {
        let mut state = self.state.lock().await;
        if !state.targets.contains(&result.url) {
            return Upsert::Untracked;
        }
        let previous = state
            .results
            .insert(result.url.clone(), result)
            .map(|old| old.status);
        Upsert::Stored { previous }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn result(url: &str, status: Status) -> ProbeResult {
        ProbeResult {
            url: url.to_string(),
            status,
            latency_seconds: if status == Status::Up { Some(0.12) } else { None },
            http_code: if status == Status::Up { Some(200) } else { None },
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let store = Store::new();
        let first = store.add_target("example.com").await.unwrap();
        assert!(first.changed);
        assert_eq!(first.url, "https://example.com/");

        let second = store.add_target("https://example.com/").await.unwrap();
        assert!(!second.changed);
        assert_eq!(store.list_targets().await, vec!["https://example.com/"]);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = Store::new();
        store.add_target("b.test").await.unwrap();
        store.add_target("a.test").await.unwrap();
        store.add_target("c.test").await.unwrap();
        assert_eq!(
            store.list_targets().await,
            vec!["https://b.test/", "https://a.test/", "https://c.test/"]
        );
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let store = Store::new();
        assert!(store.add_target("   ").await.is_err());
        assert!(store.remove_target("").await.is_err());
        assert!(store.list_targets().await.is_empty());
    }

    #[tokio::test]
    async fn removing_unknown_target_changes_nothing() {
        let store = Store::new();
        store.add_target("a.test").await.unwrap();
        store.upsert_result(result("https://a.test/", Status::Up)).await;

        let change = store.remove_target("b.test").await.unwrap();
        assert!(!change.changed);
        assert_eq!(store.list_targets().await, vec!["https://a.test/"]);
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn remove_drops_target_and_result() {
        let store = Store::new();
        store.add_target("a.test").await.unwrap();
        store.add_target("b.test").await.unwrap();
        store.upsert_result(result("https://a.test/", Status::Up)).await;
        store.upsert_result(result("https://b.test/", Status::Down)).await;

        let change = store.remove_target("A.TEST").await.unwrap();
        assert!(change.changed);
        assert_eq!(store.list_targets().await, vec!["https://b.test/"]);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].url, "https://b.test/");
    }

    #[tokio::test]
    async fn snapshot_follows_list_order_and_skips_unprobed() {
        let store = Store::new();
        store.add_target("a.test").await.unwrap();
        store.add_target("b.test").await.unwrap();
        store.add_target("c.test").await.unwrap();
        store.upsert_result(result("https://c.test/", Status::Up)).await;
        store.upsert_result(result("https://a.test/", Status::Down)).await;

        let urls: Vec<_> = store.snapshot().await.into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://a.test/", "https://c.test/"]);
    }

    #[tokio::test]
    async fn upsert_replaces_and_reports_previous_status() {
        let store = Store::new();
        store.add_target("a.test").await.unwrap();

        let first = store.upsert_result(result("https://a.test/", Status::Up)).await;
        assert_eq!(first, Upsert::Stored { previous: None });

        let second = store.upsert_result(result("https://a.test/", Status::Down)).await;
        assert_eq!(second, Upsert::Stored { previous: Some(Status::Up) });

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status, Status::Down);
    }

    #[tokio::test]
    async fn upsert_after_removal_is_discarded() {
        let store = Store::new();
        store.add_target("a.test").await.unwrap();
        store.remove_target("a.test").await.unwrap();

        let outcome = store.upsert_result(result("https://a.test/", Status::Up)).await;
        assert_eq!(outcome, Upsert::Untracked);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_adds_never_duplicate() {
        let store = Arc::new(Store::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.add_target("example.com").await.unwrap().changed
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.list_targets().await.len(), 1);
    }
}
