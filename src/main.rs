mod chart;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod model;
mod output;
mod preprocess;
mod tasks;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Commands};
use config::AppConfig;
use error::DataError;

fn run(cli: Cli) -> anyhow::Result<String> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    let summary = match cli.command {
        Commands::Iris(args) => {
            args.apply(&mut config.iris);
            tasks::iris::run(&config.iris)?.to_string()
        }
        Commands::Unemployment(args) => {
            args.apply(&mut config.unemployment);
            tasks::unemployment::run(&config.unemployment)?.to_string()
        }
        Commands::CarPrice(args) => {
            args.apply(&mut config.car_price);
            tasks::car_price::run(&config.car_price)?.to_string()
        }
    };
    Ok(summary)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(summary) => {
            print!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            match e.downcast_ref::<DataError>() {
                Some(DataError::NoTargetColumn { .. }) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
