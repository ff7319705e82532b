use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;
use qibla_logic::{BearingResult, CompassSettings, CompassUiState, Coordinate, DistanceUnit};
use qibla_test_shared::{Scenario, prelude::*, random_walk, run_scenario};

#[derive(Parser)]
/// Drive the Qibla compass core from the terminal
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Qibla bearing and distance from a position
    Bearing {
        /// Latitude of the observer in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude of the observer in degrees
        #[arg(long, allow_negative_numbers = true)]
        long: f64,
        /// Show the distance in miles
        #[arg(long)]
        miles: bool,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a compass session against a scenario file, printing every UI update as JSON
    Run {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },
    /// Run a compass session with a seeded random-walk heading stream
    Wander {
        /// Latitude of the observer in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude of the observer in degrees
        #[arg(long, allow_negative_numbers = true)]
        long: f64,
        /// Seed for the heading random walk
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of heading readings to generate
        #[arg(long, default_value_t = 20)]
        samples: u32,
        /// Milliseconds between readings
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
    },
}

fn print_state(ui: &CompassUiState) {
    match serde_json::to_string(ui) {
        Ok(line) => println!("{line}"),
        Err(why) => log::error!("Failed to serialize UI state: {why:?}"),
    }
}

fn print_bearing(observer: Coordinate, res: &BearingResult, unit: DistanceUnit) {
    println!("Observer: {observer}");
    println!("Qibla bearing: {:.2}°", res.qibla_bearing_degrees);
    println!(
        "Distance: {:.2} {}",
        unit.convert_km(res.distance_km),
        unit.suffix()
    );
}

async fn run(scenario: Scenario) {
    let end = run_scenario(scenario, print_state).await;
    info!("Session ended in {:?}", end.phase);
    print_state(&end);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    colog::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bearing {
            lat,
            long,
            miles,
            json,
        } => {
            let observer = Coordinate::new(lat, long).context("Invalid observer position")?;
            let res = qibla_logic::qibla(&observer);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&res).context("Failed to serialize result")?
                );
            } else {
                let unit = if miles {
                    DistanceUnit::Miles
                } else {
                    DistanceUnit::Kilometers
                };
                print_bearing(observer, &res, unit);
            }
        }
        Commands::Run { scenario } => {
            let scenario = Scenario::load(&scenario)?;
            run(scenario).await;
        }
        Commands::Wander {
            lat,
            long,
            seed,
            samples,
            interval_ms,
        } => {
            let observer = Coordinate::new(lat, long).context("Invalid observer position")?;
            info!("Wandering with seed {seed}");
            let scenario = Scenario {
                settings: CompassSettings::default(),
                position: Some(observer),
                events: random_walk(seed, samples, interval_ms),
                ..Default::default()
            };
            run(scenario).await;
        }
    }

    Ok(())
}
