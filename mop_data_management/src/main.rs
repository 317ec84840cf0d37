use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mop_data_management::{TripStore, TripStoreError};
use mop_lib::{kpi::TripSummary, map_renderer::MapRenderer, region::{MapConfig, Region}, trip::{Continent, NewTrip}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mop_data")]
#[command(about = "A CLI to inspect and extend the trips CSV", long_about = None)]
struct Cli {
    /// Trips CSV to use instead of the default location
    #[arg(long)]
    csv: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all trips with valid coordinates
    List,
    /// Add a trip
    Add {
        city: String,
        country: String,
        latitude: f64,
        longitude: f64,
        #[arg(long)]
        iso: Option<String>,
        /// Defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        continent: Option<Continent>,
    },
    /// Print the map figure JSON for a region
    Render {
        #[arg(long, default_value = "World")]
        region: Region,
    },
    /// Print the KPI summary
    Summary,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info,mop_data_management=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), TripStoreError> {
    let store = match cli.csv {
        Some(path) => TripStore::new(path),
        None => TripStore::default_location()?,
    };

    match cli.command {
        Commands::List => {
            for trip in store.load()? {
                println!("{:>4}  {:<24} {:>9.4} {:>10.4}  {:<3}  {}",
                    trip.id,
                    trip.label(),
                    trip.latitude,
                    trip.longitude,
                    trip.iso_alpha3.as_deref().unwrap_or("-"),
                    trip.date,
                );
            }
        },
        Commands::Add { city, country, latitude, longitude, iso, date, continent } => {
            let trip = store.append(NewTrip {
                country,
                iso_alpha3: iso,
                city,
                latitude,
                longitude,
                date,
                continent,
            })?;
            println!("Added trip {}", trip.id);
        },
        Commands::Render { region } => {
            let trips = store.load()?;
            let figure = MapRenderer::new(MapConfig::default()).render_region(&trips, region);
            println!("{}", figure.to_json());
        },
        Commands::Summary => {
            let summary = TripSummary::from_trips(&store.load()?);
            println!("Countries visited: {} ({:.1}% of the world)", summary.countries, summary.world_progress);
            println!("Cities explored:   {}", summary.cities);
            println!("Trips recorded:    {}", summary.trips);
            println!("Continents:        {} ({:.0}%)", summary.continents, summary.continent_progress);
            println!("Distance (km):     {:.0}", summary.distance_km);
        },
    }

    Ok(())
}
