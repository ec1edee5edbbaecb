//! # Movie Info Service
//!
//! A small catalogue of movie records served through reactive sources.
//!
//! This example showcases:
//! - A producer collaborator ([`MovieInfoRepository`]) exposing `Seq`/`Opt`
//! - An in-memory implementation whose every operation is cold
//! - A service composing repository calls (`flat_map`, `log`)
//!
//! ## Example
//!
//! ```no_run
//! use composable_reactor_runtime::{Driver, DriverConfig};
//! use movie_info_service::{InMemoryMovieInfoRepository, MovieInfo, MovieInfoService};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = MovieInfoService::new(InMemoryMovieInfoRepository::new());
//! let driver = Driver::tokio(DriverConfig::default())?;
//!
//! let movie = MovieInfo::new(
//!     "Batman Begins",
//!     2005,
//!     ["Christian Bale", "Michael Cane"],
//!     NaiveDate::from_ymd_opt(2005, 6, 15).unwrap_or_default(),
//! );
//! let saved = driver.collect(&service.add_movie_info(movie)).await?;
//! assert!(saved.items[0].id.is_some());
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::MovieInfo;
pub use repository::{InMemoryMovieInfoRepository, MovieInfoRepository};
pub use service::MovieInfoService;
