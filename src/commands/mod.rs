//! Command handlers for the brgy-reports CLI.
//!
//! Each report command builds a `Session`, loads its chart and renders whatever the chart shows.

mod budget;
mod expenses;
mod init;
mod summary;
mod totals;

use crate::api::{self, Mode};
use crate::error::{Error, ErrorType, IntoResult};
use crate::report::{Chart, ChartData, Diagnostics, Session, View};
use crate::{Config, Result};
use anyhow::anyhow;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, warn};

pub use budget::budget;
pub use expenses::{expenses, Expenses};
pub use init::init;
pub use summary::{nutrition, vaccination};
pub use totals::totals;

/// The output type for a command: a message for the log, optionally the structured data behind
/// it, and optionally the rendered report that goes to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,

    /// The report as a table, CSV or JSON.
    #[serde(skip)]
    output: Option<String>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
            output: None,
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
            output: None,
        }
    }

    /// Attach the rendered report.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Print the rendered report to stdout, the message to `info!` and the structured data (if it
    /// exists) as JSON to `debug!`.
    pub fn print(&self) {
        if let Some(output) = self.output() {
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
        }
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

async fn session(config: &Config, mode: Mode) -> Result<Session> {
    let backend = api::backend(config, mode)
        .await
        .pub_result(ErrorType::Config)?;
    Ok(Session::new(backend, config.cache_ttl()))
}

/// The data behind a chart after its load finished. `None` means it loaded and was empty.
fn loaded<P, T>(chart: &Chart<P, T>) -> Result<Option<&T>>
where
    P: Clone + PartialEq + Debug,
    T: ChartData,
{
    match chart.view() {
        View::Data(data) => Ok(Some(data)),
        View::Empty => Ok(None),
        View::Alert(reason) => Err(Error::new(
            ErrorType::Request,
            anyhow!("Failed to load the {} chart: {reason}", chart.name()),
        )),
        View::Blank | View::Skeleton => Err(Error::new(
            ErrorType::Report,
            anyhow!("The {} chart has not finished loading", chart.name()),
        )),
    }
}

/// Appends a note about skipped records and unreadable amounts to `message`.
fn with_diagnostics(message: String, diagnostics: &Diagnostics) -> String {
    let skipped = diagnostics.skipped.len();
    let unparsed = diagnostics.unparsed_amounts;
    if skipped == 0 && unparsed == 0 {
        return message;
    }
    warn!("{skipped} record(s) skipped and {unparsed} amount(s) unreadable");
    format!("{message} ({skipped} record(s) skipped, {unparsed} unreadable amount(s))")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordError;
    use crate::report::{ChartState, SkippedRecord};

    #[test]
    fn test_loaded_views() {
        let mut chart: Chart<i32, Vec<u8>> = Chart::new("test");
        let err = loaded(&chart).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Report);

        chart.select(2024);
        chart.resolve(Err(anyhow!("connection refused")));
        let err = loaded(&chart).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
        assert!(err.to_string().contains("connection refused"));

        chart.select(2023);
        chart.resolve(Ok(vec![]));
        assert!(loaded(&chart).unwrap().is_none());

        chart.select(2022);
        chart.resolve(Ok(vec![7]));
        assert_eq!(chart.state(), &ChartState::Success(vec![7]));
        assert_eq!(loaded(&chart).unwrap(), Some(&vec![7]));
    }

    #[test]
    fn test_with_diagnostics() {
        let clean = Diagnostics::default();
        assert_eq!(with_diagnostics("Done".into(), &clean), "Done");

        let diagnostics = Diagnostics {
            skipped: vec![SkippedRecord {
                index: 3,
                error: RecordError::MissingDatetime,
            }],
            unparsed_amounts: 2,
        };
        assert_eq!(
            with_diagnostics("Done".into(), &diagnostics),
            "Done (1 record(s) skipped, 2 unreadable amount(s))"
        );
    }

    #[test]
    fn test_out_output() {
        let out: Out<()> = Out::new_message("hi").with_output("| a |\n");
        assert_eq!(out.output(), Some("| a |\n"));
        assert!(out.structure().is_none());
    }
}
