//! Movie info service binary
//!
//! Seeds the catalogue, then prints every record as JSON.

use chrono::NaiveDate;
use composable_reactor_runtime::{Driver, DriverConfig, metrics};
use movie_info_service::{InMemoryMovieInfoRepository, MovieInfo, MovieInfoRepository, MovieInfoService};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn seed() -> anyhow::Result<Vec<MovieInfo>> {
    let date = |year, month, day| {
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| anyhow::anyhow!("invalid release date {year}-{month}-{day}"))
    };

    Ok(vec![
        MovieInfo::new(
            "Batman Begins",
            2005,
            ["Christian Bale", "Michael Cane"],
            date(2005, 6, 15)?,
        ),
        MovieInfo::new(
            "The Dark Knight",
            2008,
            ["Christian Bale", "HeathLedger"],
            date(2008, 7, 18)?,
        ),
        MovieInfo::new(
            "Dark Knight Rises",
            2012,
            ["Christian Bale", "Tom Hardy"],
            date(2012, 7, 20)?,
        )
        .with_id("abc"),
    ])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movie_info_service=info,composable_reactor_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    metrics::register_metrics();

    let repository = InMemoryMovieInfoRepository::new();
    let driver = Driver::tokio(DriverConfig::default().with_timeout(Duration::from_secs(5)))?;

    let seeded = driver.collect(&repository.save_all(seed()?)).await?;
    tracing::info!(count = seeded.items.len(), "Catalogue seeded");

    let service = MovieInfoService::new(repository);
    let all = driver.collect(&service.get_all_movie_infos()).await?;
    println!("{}", serde_json::to_string_pretty(&all.items)?);

    let found = driver.collect(&service.get_movie_info_by_id("abc")).await?;
    match found.items.first() {
        Some(movie) => println!("{}", serde_json::to_string_pretty(movie)?),
        None => tracing::warn!(id = "abc", "Movie info not found"),
    }

    Ok(())
}
