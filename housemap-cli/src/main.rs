use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use housemap_core::{LatLng, PointId};
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod location;
mod terminal;

use config::Config;
use error::{print_error_and_exit, CliError};
use terminal::TerminalPrompt;

#[derive(Parser)]
#[command(name = "housemap")]
#[command(about = "housemap - mark visited houses and draw routes on a map")]
#[command(version)]
#[command(long_about = "
housemap keeps a local record of visited houses and hand-drawn routes.
Points and routes are stored in storage.json inside the data directory.

Examples:
  housemap mark --lat 40.7128 --lng -74.006
  housemap place 40.75 -73.99
  housemap edit 1700000000000 --street 'Main St' --number 12
  housemap routes draw '40.75,-73.99;40.76,-73.98'
  housemap session
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides [storage] data_dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List visited points
    List,

    /// Change the street and/or number of a point (an empty value clears it)
    Edit {
        id: PointId,

        #[arg(long)]
        street: Option<String>,

        #[arg(long)]
        number: Option<String>,
    },

    /// Delete a point after confirmation
    Delete {
        id: PointId,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Mark the current location as visited
    Mark {
        /// Latitude to report instead of asking the location source
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
    },

    /// Place a point at a coordinate, as a map tap in placement mode would
    Place {
        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },

    /// Show, draw or clear routes
    Routes {
        #[command(subcommand)]
        action: RouteAction,
    },

    /// Interactive session with map and list views
    Session {
        /// Answer yes to every confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the effective configuration
    Config {
        /// Print the default configuration instead
        #[arg(long)]
        example: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum RouteAction {
    /// List stored routes
    Show {
        /// Print the stored GeoJSON
        #[arg(long)]
        geojson: bool,
    },

    /// Draw a segment given as 'lat,lng;lat,lng;...'
    Draw {
        #[arg(allow_hyphen_values = true)]
        path: String,
    },

    /// Delete every stored route
    Clear {
        #[arg(short, long)]
        yes: bool,
    },
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet)?;

    let mut config = Config::load(cli.config.as_deref())
        .map_err(|e| CliError::config(format!("{:#}", e)))?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    match cli.command {
        Commands::Config { example, output } => {
            commands::config::execute(&config, example, output.as_deref())?;
        }

        Commands::Session { yes } => {
            commands::session::execute(&config, yes)?;
        }

        Commands::List => {
            let app = commands::open_app(&config)?;
            commands::points::list(&app)?;
        }

        Commands::Edit { id, street, number } => {
            let app = commands::open_app(&config)?;
            commands::points::edit(&app, TerminalPrompt::default(), id, street, number)?;
        }

        Commands::Delete { id, yes } => {
            let app = commands::open_app(&config)?;
            commands::points::delete(&app, TerminalPrompt::new(yes), id)?;
        }

        Commands::Mark { lat, lng } => {
            let app = commands::open_app(&config)?;
            let at = lat.zip(lng).map(|(lat, lng)| LatLng::new(lat, lng));
            commands::map::mark(&app, &config, TerminalPrompt::default(), at)?;
        }

        Commands::Place { lat, lng } => {
            let app = commands::open_app(&config)?;
            let at = commands::parse_lat_lng(&format!("{},{}", lat, lng))?;
            commands::map::place(&app, &config, TerminalPrompt::default(), at)?;
        }

        Commands::Routes { action } => {
            let app = commands::open_app(&config)?;
            match action {
                RouteAction::Show { geojson } => commands::map::show_routes(&app, geojson)?,
                RouteAction::Draw { path } => {
                    commands::map::draw_route(&app, &config, &path)?;
                }
                RouteAction::Clear { yes } => {
                    commands::map::clear_routes(&app, TerminalPrompt::new(yes))?;
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => print_error_and_exit(cli_err),
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}
