#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the address map tool.
//!
//! Run without a subcommand for the interactive menu.

use std::path::PathBuf;

use address_map_cli::{
    GeocodeRun, OutputTarget, run_combine, run_geocode, spawn_interrupt_handler,
};
use address_map_geocoder::cancel::CancellationToken;
use address_map_geocoder::service_registry;
use address_map_geometry::LatLon;
use address_map_input::RegionFilter;
use address_map_map::{ComposeOptions, MarkerStyle, TileSource, Viewport};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "address_map", about = "Geocode address lists onto clustered maps")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode an address CSV and write a clustered map
    Geocode(GeocodeArgs),
    /// Merge the markers of saved maps (their `.json` scenes) into one map
    Combine {
        /// JSON scene files written by `geocode`
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        view: ViewArgs,
        /// Directory for the combined map
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
        /// File name prefix for the combined map
        #[arg(long, default_value = "combined")]
        prefix: String,
    },
    /// List configured geocoding services
    Services,
}

#[derive(Args)]
struct GeocodeArgs {
    /// Address CSV (contact export or `address,label` rows)
    input: PathBuf,
    /// Boundary polygon CSV (`polygon_id,lat,lon[,vertex_order][,name]`)
    #[arg(long, default_value = "polygons.csv")]
    polygons: PathBuf,
    /// Build the map without polygons
    #[arg(long)]
    no_polygons: bool,
    /// Geocoding service API key
    #[arg(long, env = "LOCATIONIQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Geocoding service id (see `services`)
    #[arg(long)]
    service: Option<String>,
    /// Keep only rows in this city (case-insensitive)
    #[arg(long, default_value = "winnetka")]
    city: String,
    /// Keep only rows in this state (case-insensitive)
    #[arg(long, default_value = "il")]
    state: String,
    /// Keep every row regardless of city and state
    #[arg(long)]
    all_regions: bool,
    /// Marker popup style: `contact` or `label`
    #[arg(long, default_value = "contact", value_parser = parse_style)]
    style: MarkerStyle,
    #[command(flatten)]
    view: ViewArgs,
    /// Directory for the map files
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// File name prefix for the map files
    #[arg(long, default_value = "address_map")]
    prefix: String,
}

#[derive(Args)]
struct ViewArgs {
    /// Initial map center latitude
    #[arg(long, default_value_t = 42.1080, allow_negative_numbers = true)]
    center_lat: f64,
    /// Initial map center longitude
    #[arg(long, default_value_t = -87.7352, allow_negative_numbers = true)]
    center_lon: f64,
    /// Initial zoom level
    #[arg(long, default_value_t = 14)]
    zoom: u8,
}

fn parse_style(value: &str) -> Result<MarkerStyle, String> {
    value
        .parse()
        .map_err(|_| format!("unknown marker style '{value}' (expected contact or label)"))
}

impl From<ViewArgs> for Viewport {
    fn from(view: ViewArgs) -> Self {
        Self {
            center: LatLon::new(view.center_lat, view.center_lon),
            zoom: view.zoom,
            tiles: TileSource::openstreetmap(),
        }
    }
}

impl From<GeocodeArgs> for GeocodeRun {
    fn from(args: GeocodeArgs) -> Self {
        let filter = if args.all_regions {
            RegionFilter::default()
        } else {
            RegionFilter::new(Some(&args.city), Some(&args.state))
        };

        Self {
            input: args.input,
            polygons: (!args.no_polygons).then_some(args.polygons),
            style: args.style,
            filter,
            api_key: args.api_key,
            service: args.service,
            compose: ComposeOptions {
                viewport: args.view.into(),
                ..ComposeOptions::default()
            },
            output: OutputTarget {
                dir: args.output_dir,
                prefix: args.prefix,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = address_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return address_map_cli::interactive::run(&multi).await;
    };

    match command {
        Commands::Geocode(args) => {
            let cancel = CancellationToken::new();
            let handler = spawn_interrupt_handler(cancel.clone());

            let result = run_geocode(&args.into(), &multi, &cancel).await;
            handler.abort();

            let written = result?;
            println!("Map saved to {}", written.html.display());
            if written.interrupted {
                println!("Geocoding was interrupted; the map holds partial results.");
            }
        }
        Commands::Combine {
            inputs,
            view,
            output_dir,
            prefix,
        } => {
            let target = OutputTarget {
                dir: output_dir,
                prefix,
            };
            let written = run_combine(&inputs, view.into(), &target)?;
            println!(
                "Combined {} markers into {}",
                written.markers,
                written.html.display()
            );
        }
        Commands::Services => {
            let services = service_registry::all_services();
            println!("{:<16} {:<10} NAME", "ID", "ENABLED");
            println!("{}", "-".repeat(50));
            for service in &services {
                println!(
                    "{:<16} {:<10} {} ({})",
                    service.id,
                    service.enabled,
                    service.name,
                    service.base_url()
                );
            }
        }
    }

    Ok(())
}
