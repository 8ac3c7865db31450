//! Location search with last-write-wins results.
//!
//! Every keystroke starts a new generation. A lookup remembers the
//! generation it started in and its result is applied only if no newer
//! keystroke arrived while it was in flight.

use skycast_core::LocationSuggestion;
use skycast_fetch::FetchError;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// What happened to one search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results were applied and are now the current suggestions.
    Applied(Vec<LocationSuggestion>),
    /// A newer keystroke superseded this request.
    Stale,
    /// The input was empty; suggestions were cleared.
    Cleared,
}

/// Search state shared between keystrokes.
#[derive(Debug, Clone, Default)]
pub struct LocationSearch {
    generation: Arc<AtomicU64>,
    suggestions: Arc<Mutex<Vec<LocationSuggestion>>>,
}

impl LocationSearch {
    /// Creates an idle search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation and returns it.
    pub fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns true if no keystroke arrived since `generation` started.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Returns the applied suggestions.
    pub fn suggestions(&self) -> Vec<LocationSuggestion> {
        self.suggestions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Handles one keystroke.
    ///
    /// `lookup` receives the trimmed text. Errors from a superseded lookup
    /// are swallowed as [`SearchOutcome::Stale`].
    ///
    /// # Errors
    ///
    /// The lookup's error, if this request is still current.
    pub async fn run<F, Fut>(&self, text: &str, lookup: F) -> Result<SearchOutcome, FetchError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<LocationSuggestion>, FetchError>>,
    {
        let generation = self.bump();
        let text = text.trim();

        if text.is_empty() {
            self.suggestions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            return Ok(SearchOutcome::Cleared);
        }

        tokio::task::yield_now().await;
        if !self.is_current(generation) {
            debug!(generation, "Search superseded before lookup");
            return Ok(SearchOutcome::Stale);
        }

        let result = lookup(text.to_string()).await;

        let mut suggestions = self
            .suggestions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(generation) {
            debug!(generation, "Search superseded during lookup");
            return Ok(SearchOutcome::Stale);
        }
        let found = result?;
        debug!(generation, count = found.len(), "Applying search results");
        suggestions.clone_from(&found);
        Ok(SearchOutcome::Applied(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    fn suggestion(name: &str) -> LocationSuggestion {
        LocationSuggestion::new(name, name)
    }

    #[tokio::test]
    async fn test_applies_current_results() {
        let search = LocationSearch::new();
        let outcome = search
            .run("sea", |text| async move { Ok(vec![suggestion(&format!("{text}ttle"))]) })
            .await
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Applied(vec![suggestion("seattle")]));
        assert_eq!(search.suggestions(), vec![suggestion("seattle")]);
    }

    #[tokio::test]
    async fn test_empty_input_clears() {
        let search = LocationSearch::new();
        search
            .run("par", |_| async { Ok(vec![suggestion("Paris")]) })
            .await
            .unwrap();
        let before = search.generation();

        let outcome = search
            .run("   ", |_| async { Ok(vec![suggestion("never")]) })
            .await
            .unwrap();
        assert_eq!(outcome, SearchOutcome::Cleared);
        assert!(search.suggestions().is_empty());
        assert_eq!(search.generation(), before + 1);
    }

    #[tokio::test]
    async fn test_slow_lookup_is_discarded() {
        let search = LocationSearch::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (started_tx, started_rx) = oneshot::channel::<()>();

        let slow = {
            let search = search.clone();
            tokio::spawn(async move {
                search
                    .run("sea", |_| async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok(vec![suggestion("Seaside")])
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        let fast = search
            .run("seattle", |_| async { Ok(vec![suggestion("Seattle")]) })
            .await
            .unwrap();
        assert_eq!(fast, SearchOutcome::Applied(vec![suggestion("Seattle")]));

        release_tx.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), SearchOutcome::Stale);
        assert_eq!(search.suggestions(), vec![suggestion("Seattle")]);
    }

    #[tokio::test]
    async fn test_stale_error_is_swallowed() {
        let search = LocationSearch::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (started_tx, started_rx) = oneshot::channel::<()>();

        let slow = {
            let search = search.clone();
            tokio::spawn(async move {
                search
                    .run("x", |_| async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Err(FetchError::Timeout(10))
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        search.bump();
        release_tx.send(()).unwrap();
        assert_eq!(slow.await.unwrap().unwrap(), SearchOutcome::Stale);
    }
}
