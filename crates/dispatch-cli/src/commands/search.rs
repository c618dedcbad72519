use anyhow::{Context, Result};
use dispatch_core::models::{Point, RankedDriver, SearchQuery};
use dispatch_matching::{LocationClient, LocationClientConfig};
use tabled::Tabled;

use crate::cli::SearchArgs;
use crate::output::OutputWriter;

#[derive(Debug, Tabled)]
struct DriverRow {
    #[tabled(rename = "Driver")]
    id: String,
    #[tabled(rename = "Longitude")]
    longitude: f64,
    #[tabled(rename = "Latitude")]
    latitude: f64,
    #[tabled(rename = "Distance (m)")]
    distance: String,
}

impl From<&RankedDriver> for DriverRow {
    fn from(ranked: &RankedDriver) -> Self {
        Self {
            id: ranked.driver.id.clone(),
            longitude: ranked.driver.location.longitude(),
            latitude: ranked.driver.location.latitude(),
            distance: format!("{:.2}", ranked.distance),
        }
    }
}

pub async fn execute(args: SearchArgs, output: &OutputWriter) -> Result<()> {
    let mut config = LocationClientConfig::new(args.service.url.as_str());
    if let Some(key) = &args.service.api_key {
        config = config.with_api_key(key.as_str());
    }
    let client = LocationClient::new(config)?;

    let mut query = SearchQuery::new(Point::new(args.lon, args.lat), args.radius);
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }

    let drivers = client
        .search_nearby(&query)
        .await
        .context("nearby search failed")?;

    if output.is_json() {
        return output.result(&drivers);
    }

    output.info(format!(
        "{} drivers within {} m of ({}, {})",
        drivers.len(),
        args.radius,
        args.lon,
        args.lat
    ));
    output.table(drivers.iter().map(DriverRow::from).collect());
    Ok(())
}
