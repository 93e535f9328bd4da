use brgy_reports::args::{Args, Command};
use brgy_reports::{commands, Config, Mode, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().brgy_home().path();

    // When BRGY_REPORTS_IN_TEST_MODE is set and non-empty the mode is Mode::Test and seeded data
    // is served instead of calling the backend.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.api_url(), init_args.token_file())
                .await?
                .print()
        }

        Command::Expenses(expenses_args) => {
            let config = Config::load(home).await?;
            commands::expenses(config, mode, expenses_args.clone())
                .await?
                .print()
        }

        Command::Totals(report_args) => {
            let config = Config::load(home).await?;
            commands::totals(config, mode, report_args.clone())
                .await?
                .print()
        }

        Command::Budget(report_args) => {
            let config = Config::load(home).await?;
            commands::budget(config, mode, report_args.clone())
                .await?
                .print()
        }

        Command::Nutrition(nutrition_args) => {
            let config = Config::load(home).await?;
            commands::nutrition(config, mode, nutrition_args.clone())
                .await?
                .print()
        }

        Command::Vaccination(report_args) => {
            let config = Config::load(home).await?;
            commands::vaccination(config, mode, report_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            env!("CARGO_BIN_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
