mod cli;
use clap::Parser;
use coursedesk::{App, Config};
use dotenv::dotenv;
use log::{error, info};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use crate::cli::Cli;

// Entry point for the async main function, powered by tokio runtime.
#[tokio::main]
async fn main() {
    // Loads environment variables from a `.env` file, if present.
    dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {:#}", e);
            std::process::exit(2);
        }
    };

    // Logs to the terminal, warnings and errors on stderr, the rest on stdout.
    if let Err(e) = TermLogger::init(
        config.log_level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Logger already initialised: {}", e);
    }

    let app = match App::connect(&config) {
        Ok(app) => {
            info!("Using backend at {}", config.api_url);
            app
        }
        Err(e) => {
            error!("Error starting the client: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, &app).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
