//! Command-line front end for the impact pipeline.
//!
//! Plays the role of the dashboard form and its JSON/debug view: endpoint
//! specs come in as flags, one query runs through the orchestrator, and the
//! final result prints as JSON. Exits non-zero when the result carries an
//! error.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use impact_core::{LocationSpec, QueryResult};
use impact_geocode::GeocoderClient;
use impact_pipeline::{Orchestrator, Presenter};
use impact_query::{PollConfig, QueryClient};

#[derive(Debug, Parser)]
#[command(name = "impact")]
#[command(about = "Query aggregated network performance between two endpoints")]
struct Cli {
    /// Client endpoint kind: global, latlng, or cityregioncountry.
    #[arg(long, default_value = "global")]
    client_type: String,
    #[arg(long)]
    client_lat: Option<f64>,
    #[arg(long)]
    client_lng: Option<f64>,
    #[arg(long, default_value = "")]
    client_city: String,
    #[arg(long, default_value = "")]
    client_region: String,
    #[arg(long, default_value = "")]
    client_country: String,

    /// Server endpoint kind: global, latlng, or cityregioncountry.
    #[arg(long, default_value = "global")]
    server_type: String,
    #[arg(long)]
    server_lat: Option<f64>,
    #[arg(long)]
    server_lng: Option<f64>,
    #[arg(long, default_value = "")]
    server_city: String,
    #[arg(long, default_value = "")]
    server_region: String,
    #[arg(long, default_value = "")]
    server_country: String,
}

/// Prints each terminal result as the JSON debug view.
struct JsonPresenter;

impl Presenter for JsonPresenter {
    fn present(&self, result: &QueryResult) {
        match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "failed to render query result"),
        }
    }
}

fn parse_spec(
    which: &str,
    kind: &str,
    lat: Option<f64>,
    lng: Option<f64>,
    city: &str,
    region: &str,
    country: &str,
) -> anyhow::Result<LocationSpec> {
    match kind {
        "global" => Ok(LocationSpec::Global),
        "latlng" => {
            let (Some(latitude), Some(longitude)) = (lat, lng) else {
                anyhow::bail!("--{which}-lat and --{which}-lng are required for type latlng");
            };
            Ok(LocationSpec::LatLng {
                latitude,
                longitude,
            })
        }
        "cityregioncountry" => Ok(LocationSpec::CityRegionCountry {
            city: city.to_owned(),
            region: region.to_owned(),
            country: country.to_owned(),
        }),
        other => anyhow::bail!(
            "unknown location type {other:?} for {which} \
             (expected global, latlng, or cityregioncountry)"
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = impact_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let client_spec = parse_spec(
        "client",
        &cli.client_type,
        cli.client_lat,
        cli.client_lng,
        &cli.client_city,
        &cli.client_region,
        &cli.client_country,
    )?;
    let server_spec = parse_spec(
        "server",
        &cli.server_type,
        cli.server_lat,
        cli.server_lng,
        &cli.server_city,
        &cli.server_region,
        &cli.server_country,
    )?;

    let geocoder = GeocoderClient::with_base_url(
        config.request_timeout_secs,
        &config.user_agent,
        config.geocode_api_key.as_deref(),
        &config.geocode_base_url,
    )?;
    let backend = QueryClient::new(
        &config.backend_base_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let poll = PollConfig::from_app_config(&config);

    let orchestrator = Orchestrator::new(geocoder, backend, poll, Arc::new(JsonPresenter));
    let ticket = orchestrator.submit(client_spec, server_spec);
    let Some(result) = ticket.wait().await else {
        anyhow::bail!("query was superseded before it finished");
    };

    if let Some(error) = &result.error {
        anyhow::bail!("query ended with an error: {error}");
    }
    Ok(())
}
