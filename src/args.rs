//! These structs provide the CLI interface for the brgy-reports CLI.

use crate::model::Quarter;
use crate::report::OutputFormat;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// brgy-reports: Financial and health reports for a barangay administration.
///
/// This program fetches income and expense records, budget items and health summaries from the
/// barangay backend and prints them as chart-ready tables: quarterly spending per budget item,
/// income against expenses, nutritional status and vaccination status.
///
/// Run `brgy-reports init --api-url <URL>` once to point the program at the backend.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and the configuration file.
    ///
    /// This is the first command you should run. You need the base URL of the barangay backend
    /// API and, if the backend requires one, a file containing an API token. The token file is
    /// moved into $BRGY_HOME/.secrets.
    Init(InitArgs),
    /// Expenses per budget item for each quarter of a year, or for one quarter.
    Expenses(ExpensesArgs),
    /// Income against expenses for each quarter of a year.
    Totals(ReportArgs),
    /// The budget items of a year and their proposed budgets.
    Budget(ReportArgs),
    /// Nutritional status of children by sex, for a year or one month of it.
    Nutrition(NutritionArgs),
    /// Vaccination status by age group for a year.
    Vaccination(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where configuration is held. Defaults to ~/brgy-reports
    #[arg(long, env = "BRGY_HOME", default_value_t = default_brgy_home())]
    brgy_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, brgy_home: PathBuf) -> Self {
        Self {
            log_level,
            brgy_home: brgy_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn brgy_home(&self) -> &DisplayPath {
        &self.brgy_home
    }
}

/// Args for the `brgy-reports init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of the backend API, e.g. https://brgy.example.ph/api/
    #[arg(long)]
    api_url: String,

    /// A file containing the API bearer token. It is moved into the secrets directory.
    #[arg(long)]
    token_file: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>, token_file: Option<PathBuf>) -> Self {
        Self {
            api_url: api_url.into(),
            token_file,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }
}

/// Args shared by every report.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// The year to report on. Defaults to the current year.
    #[arg(long, default_value_t = current_year())]
    year: i32,

    /// How to print the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl ReportArgs {
    pub fn new(year: i32, format: OutputFormat) -> Self {
        Self { year, format }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Args for the `brgy-reports expenses` command.
#[derive(Debug, Parser, Clone)]
pub struct ExpensesArgs {
    #[clap(flatten)]
    report: ReportArgs,

    /// Only show budget items with spending in this quarter: Q1, Q2, Q3 or Q4.
    #[arg(long, value_enum)]
    quarter: Option<Quarter>,
}

impl ExpensesArgs {
    pub fn new(report: ReportArgs, quarter: Option<Quarter>) -> Self {
        Self { report, quarter }
    }

    pub fn report(&self) -> &ReportArgs {
        &self.report
    }

    pub fn quarter(&self) -> Option<Quarter> {
        self.quarter
    }
}

/// Args for the `brgy-reports nutrition` command.
#[derive(Debug, Parser, Clone)]
pub struct NutritionArgs {
    #[clap(flatten)]
    report: ReportArgs,

    /// Only count weighings from this month, 1 to 12.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,
}

impl NutritionArgs {
    pub fn new(report: ReportArgs, month: Option<u32>) -> Self {
        Self { report, month }
    }

    pub fn report(&self) -> &ReportArgs {
        &self.report
    }

    pub fn month(&self) -> Option<u32> {
        self.month
    }
}

fn current_year() -> i32 {
    Local::now().year()
}

fn default_brgy_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("brgy-reports"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --brgy-home or BRGY_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("brgy-reports")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expenses() {
        let args = Args::try_parse_from([
            "brgy-reports",
            "--brgy-home",
            "/tmp/brgy",
            "expenses",
            "--year",
            "2024",
            "--quarter",
            "Q2",
            "--format",
            "csv",
        ])
        .unwrap();
        assert_eq!(args.common().brgy_home().path(), Path::new("/tmp/brgy"));
        match args.command() {
            Command::Expenses(e) => {
                assert_eq!(e.report().year(), 2024);
                assert_eq!(e.report().format(), OutputFormat::Csv);
                assert_eq!(e.quarter(), Some(Quarter::Q2));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_quarter_alias() {
        let args =
            Args::try_parse_from(["brgy-reports", "expenses", "--quarter", "3"]).unwrap();
        match args.command() {
            Command::Expenses(e) => assert_eq!(e.quarter(), Some(Quarter::Q3)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_month_out_of_range() {
        assert!(Args::try_parse_from(["brgy-reports", "nutrition", "--month", "13"]).is_err());
        let args = Args::try_parse_from(["brgy-reports", "nutrition", "--month", "12"]).unwrap();
        match args.command() {
            Command::Nutrition(n) => {
                assert_eq!(n.month(), Some(12));
                assert_eq!(n.report().year(), current_year());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_log_level() {
        let args =
            Args::try_parse_from(["brgy-reports", "--log-level", "debug", "budget"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
    }
}
