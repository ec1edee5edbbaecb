//! Movie info operations composed over a repository.

use crate::domain::MovieInfo;
use crate::repository::MovieInfoRepository;
use composable_reactor_core::{Opt, Seq};
use std::sync::Arc;

/// Movie catalogue operations
///
/// Every operation returns a cold source built from repository calls.
#[derive(Debug)]
pub struct MovieInfoService<R> {
    repository: Arc<R>,
}

impl<R> Clone for MovieInfoService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: MovieInfoRepository> MovieInfoService<R> {
    /// Create a service over `repository`
    #[must_use]
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// The repository backing this service
    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Store a new record; the saved record carries its id.
    #[must_use]
    pub fn add_movie_info(&self, movie: MovieInfo) -> Opt<MovieInfo> {
        self.repository.save(movie).log("add_movie_info")
    }

    /// Every stored record.
    #[must_use]
    pub fn get_all_movie_infos(&self) -> Seq<MovieInfo> {
        self.repository.find_all().log("get_all_movie_infos")
    }

    /// The record with `id`, or empty.
    #[must_use]
    pub fn get_movie_info_by_id(&self, id: &str) -> Opt<MovieInfo> {
        self.repository.find_by_id(id).log("get_movie_info_by_id")
    }

    /// Overwrite the record with `id` by the fields of `updated`.
    ///
    /// Completes empty when no record has that id; nothing is saved then.
    #[must_use]
    pub fn update_movie_info(&self, updated: MovieInfo, id: &str) -> Opt<MovieInfo> {
        let repository = Arc::clone(&self.repository);
        self.repository
            .find_by_id(id)
            .flat_map(move |existing| repository.save(existing.overwritten_by(&updated)))
            .log("update_movie_info")
    }

    /// Remove the record with `id`; completes empty.
    #[must_use]
    pub fn delete_movie_info(&self, id: &str) -> Opt<()> {
        self.repository.delete_by_id(id).log("delete_movie_info")
    }
}
