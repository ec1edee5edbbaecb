//! Names service binary
//!
//! Drives the `names` and `name` sources and prints every value.

use composable_reactor_runtime::{Driver, DriverConfig, metrics};
use names_service::NamesService;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "names_service=info,composable_reactor_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    metrics::register_metrics();

    let service = NamesService::new();
    let driver = Driver::tokio(DriverConfig::default().with_timeout(Duration::from_secs(5)))?;

    driver
        .drive(
            &service.names(),
            |name| println!("Name is : {name}"),
            |terminal| tracing::info!(%terminal, "names finished"),
        )
        .await?;

    driver
        .drive(
            &service.name(),
            |name| println!("Single name is : {name}"),
            |terminal| tracing::info!(%terminal, "name finished"),
        )
        .await?;

    Ok(())
}
