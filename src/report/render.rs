//! Renders report data as a terminal table, CSV or JSON.

use crate::error::Res;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The output format of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// An aligned Markdown table.
    #[default]
    Table,
    /// CSV with a header row.
    Csv,
    /// The structured report as pretty-printed JSON.
    Json,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// A header row and data rows of already-formatted cells.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with empty cells.
    pub fn push<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() < self.headers.len() {
            row.resize(self.headers.len(), String::new());
        }
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (ix, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(ix) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }

    fn to_csv(&self) -> Res<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .context("Unable to write CSV headers")?;
        for row in &self.rows {
            writer.write_record(row).context("Unable to write CSV row")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush CSV: {e}"))?;
        String::from_utf8(bytes).context("CSV output was not UTF-8")
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let widths = self.widths();
        let line = |f: &mut Formatter<'_>, cells: &[String]| -> std::fmt::Result {
            write!(f, "|")?;
            for (ix, width) in widths.iter().enumerate() {
                let cell = cells.get(ix).map(String::as_str).unwrap_or_default();
                let pad = width - cell.chars().count();
                write!(f, " {cell}{} |", " ".repeat(pad))?;
            }
            writeln!(f)
        };
        line(f, &self.headers)?;
        write!(f, "|")?;
        for width in &widths {
            write!(f, "{}|", "-".repeat(width + 2))?;
        }
        writeln!(f)?;
        for row in &self.rows {
            line(f, row)?;
        }
        Ok(())
    }
}

/// Renders `table` in `format`. JSON renders `data` instead, which carries more than the table
/// shows.
pub fn render<T>(format: OutputFormat, table: &Table, data: &T) -> Res<String>
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => Ok(table.to_string()),
        OutputFormat::Csv => table.to_csv(),
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Unable to serialize report to JSON")
        }
    }
}
