//! Multi-sub-query retrieval into an ordered, deduplicated source set.

pub mod client;

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::warn;

use client::{SearchClient, SearchError, SearchHit};

/// Sub-query searches in flight at once.
const MAX_CONCURRENT_SEARCHES: usize = 4;

/// A unique source URL with the title the provider gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub url: String,
    pub title: String,
}

/// Run every sub-query against the provider and merge the hits into a
/// deduplicated source list. Searches run concurrently, but the final order
/// is a pure function of (sub-query index, provider rank): the first
/// sub-query to surface a URL wins its position, regardless of which request
/// finished first. A failed sub-query contributes nothing; if all fail, the
/// result is empty.
pub async fn retrieve(search: &impl SearchClient, subqueries: &[String]) -> Vec<Source> {
    let mut outcomes: Vec<(usize, Result<Vec<SearchHit>, SearchError>)> =
        stream::iter(subqueries.iter().enumerate())
            .map(|(index, query)| async move { (index, search.search(query).await) })
            .buffer_unordered(MAX_CONCURRENT_SEARCHES)
            .collect()
            .await;

    // Reconcile arrival order back into sub-query order before merging.
    outcomes.sort_by_key(|(index, _)| *index);

    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for (index, outcome) in outcomes {
        match outcome {
            Ok(hits) => {
                for hit in hits {
                    if !hit.url.is_empty() && seen.insert(hit.url.clone()) {
                        sources.push(Source {
                            url: hit.url,
                            title: hit.title,
                        });
                    }
                }
            }
            Err(e) => {
                warn!(subquery = %subqueries[index], error = %e, "sub-query search failed (continuing)");
            }
        }
    }

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MappedSearch {
        responses: HashMap<&'static str, Vec<(&'static str, &'static str)>>,
        failing: Vec<&'static str>,
        queries: Mutex<Vec<String>>,
    }

    impl MappedSearch {
        fn new(responses: HashMap<&'static str, Vec<(&'static str, &'static str)>>) -> Self {
            Self {
                responses,
                failing: Vec::new(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn with_failures(mut self, failing: Vec<&'static str>) -> Self {
            self.failing = failing;
            self
        }
    }

    impl SearchClient for MappedSearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.failing.contains(&query) {
                return Err(SearchError::RateLimited);
            }
            Ok(self
                .responses
                .get(query)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(rank, (url, title))| SearchHit {
                    url: url.to_string(),
                    title: title.to_string(),
                    rank,
                })
                .collect())
        }
    }

    fn subqueries(queries: &[&str]) -> Vec<String> {
        queries.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn sources_follow_subquery_then_rank_order() {
        let search = MappedSearch::new(HashMap::from([
            ("first", vec![("https://a.az", "A"), ("https://b.az", "B")]),
            ("second", vec![("https://c.az", "C")]),
        ]));

        let sources = retrieve(&search, &subqueries(&["first", "second"])).await;

        let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, ["https://a.az", "https://b.az", "https://c.az"]);
    }

    #[tokio::test]
    async fn repeated_urls_keep_their_first_seen_position() {
        let search = MappedSearch::new(HashMap::from([
            ("first", vec![("https://a.az", "A"), ("https://b.az", "B")]),
            (
                "second",
                vec![("https://b.az", "B again"), ("https://c.az", "C")],
            ),
        ]));

        let sources = retrieve(&search, &subqueries(&["first", "second"])).await;

        let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, ["https://a.az", "https://b.az", "https://c.az"]);
        // the first sub-query's title wins
        assert_eq!(sources[1].title, "B");
    }

    #[tokio::test]
    async fn one_failed_subquery_does_not_abort_the_rest() {
        let search = MappedSearch::new(HashMap::from([(
            "second",
            vec![("https://c.az", "C")],
        )]))
        .with_failures(vec!["first"]);

        let sources = retrieve(&search, &subqueries(&["first", "second"])).await;

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://c.az");
        assert_eq!(search.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn all_failures_yield_an_empty_set() {
        let search =
            MappedSearch::new(HashMap::new()).with_failures(vec!["first", "second"]);

        let sources = retrieve(&search, &subqueries(&["first", "second"])).await;
        assert!(sources.is_empty());
    }
}
