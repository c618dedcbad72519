use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dispatch - driver location tooling
#[derive(Parser, Debug)]
#[command(name = "dispatch")]
#[command(about = "Driver location import and search tooling", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bulk-import driver locations from a CSV file
    Import(ImportArgs),

    /// Find drivers near a point
    Search(SearchArgs),
}

/// Location service connection options shared by all commands
#[derive(Args, Debug, Clone)]
pub struct LocationServiceArgs {
    /// Base URL of the location service
    #[arg(long, env = "DISPATCH_LOCATION_URL", default_value = "http://localhost:8086")]
    pub url: String,

    /// API key sent as X-API-Key
    #[arg(long, env = "DISPATCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// CSV file with a header row and `latitude,longitude` columns
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    #[command(flatten)]
    pub service: LocationServiceArgs,

    /// Drivers per batch request
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub batch_size: u32,

    /// Concurrent batch uploads
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub workers: u32,

    /// Seconds to wait for one batch request before counting it as failed
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Longitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Latitude of the search center
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Search radius in meters
    #[arg(long, default_value_t = 1000.0)]
    pub radius: f64,

    /// Maximum number of drivers to return
    #[arg(long)]
    pub limit: Option<i64>,

    #[command(flatten)]
    pub service: LocationServiceArgs,
}
