//! Storage seam for movie records and its in-memory implementation.

use crate::domain::MovieInfo;
use composable_reactor_core::{Opt, Seq};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Reactive access to stored movie records
///
/// Every method returns a cold source: nothing touches storage until the
/// source is driven, and driving it twice runs the operation twice.
pub trait MovieInfoRepository: Send + Sync + 'static {
    /// Every stored record
    fn find_all(&self) -> Seq<MovieInfo>;

    /// The record with `id`, or empty
    fn find_by_id(&self, id: &str) -> Opt<MovieInfo>;

    /// Insert or replace `movie`, assigning an id if it has none
    fn save(&self, movie: MovieInfo) -> Opt<MovieInfo>;

    /// [`save`](Self::save) each record in order
    fn save_all(&self, movies: Vec<MovieInfo>) -> Seq<MovieInfo>;

    /// Remove the record with `id`; always completes empty
    fn delete_by_id(&self, id: &str) -> Opt<()>;

    /// Remove every record; always completes empty
    fn delete_all(&self) -> Opt<()>;
}

/// Repository holding records in a map, keyed by id
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMovieInfoRepository {
    records: Arc<RwLock<BTreeMap<String, MovieInfo>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryMovieInfoRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequential id not already taken by a stored record
    fn generate_id(&self, records: &BTreeMap<String, MovieInfo>) -> String {
        loop {
            let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
            if !records.contains_key(&id) {
                return id;
            }
        }
    }
}

impl MovieInfoRepository for InMemoryMovieInfoRepository {
    fn find_all(&self) -> Seq<MovieInfo> {
        let records = Arc::clone(&self.records);
        Opt::from_future(move || {
            let records = Arc::clone(&records);
            async move { Ok(Some(records.read().await.values().cloned().collect::<Vec<_>>())) }
        })
        .flat_map_many(Seq::from_iterable)
    }

    fn find_by_id(&self, id: &str) -> Opt<MovieInfo> {
        let records = Arc::clone(&self.records);
        let id = id.to_string();
        Opt::from_future(move || {
            let records = Arc::clone(&records);
            let id = id.clone();
            async move { Ok(records.read().await.get(&id).cloned()) }
        })
    }

    fn save(&self, movie: MovieInfo) -> Opt<MovieInfo> {
        let repository = self.clone();
        Opt::from_future(move || {
            let repository = repository.clone();
            let mut movie = movie.clone();
            async move {
                let mut records = repository.records.write().await;
                let id = match &movie.id {
                    Some(id) => id.clone(),
                    None => {
                        let id = repository.generate_id(&records);
                        movie.id = Some(id.clone());
                        id
                    },
                };
                tracing::debug!(%id, name = %movie.name, "Saving movie info");
                records.insert(id, movie.clone());
                Ok(Some(movie))
            }
        })
    }

    fn save_all(&self, movies: Vec<MovieInfo>) -> Seq<MovieInfo> {
        let repository = self.clone();
        Seq::from_iterable(movies).concat_map(move |movie| repository.save(movie).into_seq())
    }

    fn delete_by_id(&self, id: &str) -> Opt<()> {
        let records = Arc::clone(&self.records);
        let id = id.to_string();
        Opt::from_future(move || {
            let records = Arc::clone(&records);
            let id = id.clone();
            async move {
                let removed = records.write().await.remove(&id);
                tracing::debug!(%id, found = removed.is_some(), "Deleted movie info");
                Ok(None)
            }
        })
    }

    fn delete_all(&self) -> Opt<()> {
        let records = Arc::clone(&self.records);
        Opt::from_future(move || {
            let records = Arc::clone(&records);
            async move {
                records.write().await.clear();
                Ok(None)
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use composable_reactor_core::Terminal;
    use composable_reactor_testing::{SeqVerifier, VirtualScheduler, run_virtual};

    fn movie(name: &str) -> MovieInfo {
        MovieInfo::new(name, 2005, ["Christian Bale"], NaiveDate::from_ymd_opt(2005, 6, 15).unwrap())
    }

    #[test]
    fn save_assigns_sequential_ids() {
        let repository = InMemoryMovieInfoRepository::new();
        let saved = run_virtual(
            &repository.save_all(vec![movie("one"), movie("two").with_id("abc"), movie("three")]),
            &VirtualScheduler::new(),
        )
        .unwrap();

        let ids: Vec<_> = saved.items.iter().map(|m| m.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["1", "abc", "2"]);
    }

    #[test]
    fn generated_ids_skip_ids_supplied_by_callers() {
        let repository = InMemoryMovieInfoRepository::new();
        let saved = run_virtual(
            &repository.save_all(vec![movie("explicit").with_id("1"), movie("generated")]),
            &VirtualScheduler::new(),
        )
        .unwrap();

        let ids: Vec<_> = saved.items.iter().map(|m| m.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2"]);

        SeqVerifier::create(repository.find_by_id("1"))
            .assert_next(|stored| assert_eq!(stored.name, "explicit"))
            .verify_complete();
        SeqVerifier::create(repository.find_all())
            .expect_next_count(2)
            .verify_complete();
    }

    #[test]
    fn operations_are_cold() {
        let repository = InMemoryMovieInfoRepository::new();
        let pending_save = repository.save(movie("never driven"));

        SeqVerifier::create(repository.find_all()).verify_complete();
        drop(pending_save);
        SeqVerifier::create(repository.find_all()).verify_complete();
    }

    #[test]
    fn delete_completes_empty() {
        let repository = InMemoryMovieInfoRepository::new();
        let outcome = run_virtual(&repository.delete_by_id("missing"), &VirtualScheduler::new()).unwrap();

        assert_eq!(outcome.terminal, Terminal::Empty);
    }
}
