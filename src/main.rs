mod predict;
mod tle;
mod web;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::web::api::passes::{compute_passes, PassesRequest, RequestValue};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "pass-o-mat")]
#[command(about = "Satellite pass prediction service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        config: Option<String>,
    },
    /// Print the passes of one object over the next 24 hours
    Predict {
        #[arg(long)]
        satellite_id: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: String,
        #[arg(long, allow_hyphen_values = true)]
        lng: String,
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(config.as_deref()).await,
        Commands::Predict {
            satellite_id,
            lat,
            lng,
            config,
        } => predict(satellite_id, lat, lng, config.as_deref()).await,
    }
}

async fn serve(config_path: Option<&str>) -> ExitCode {
    let config = match Config::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn predict(
    satellite_id: String,
    lat: String,
    lng: String,
    config_path: Option<&str>,
) -> ExitCode {
    let config = match Config::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let request = PassesRequest {
        satellite_id: Some(RequestValue::Text(satellite_id)),
        lat: Some(RequestValue::Text(lat)),
        lng: Some(RequestValue::Text(lng)),
    };

    let policy = config.predict.window_edge;
    let query = match request.validate(config.predict.observer_height_m) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match web::server::build_state(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing element set source: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match compute_passes(&state.fetcher, &query, policy, Utc::now()).await {
        Ok(records) => match serde_json::to_string_pretty(&records) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error formatting passes: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            match e.details() {
                Some(details) => eprintln!("{}: {}", e, details),
                None => eprintln!("{}", e),
            }
            ExitCode::FAILURE
        }
    }
}
