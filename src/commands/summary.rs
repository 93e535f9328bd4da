use crate::api::{Mode, SummaryKind, SummaryQuery};
use crate::args::{NutritionArgs, ReportArgs};
use crate::commands::{loaded, session, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::GroupedCounts;
use crate::report::{counts_table, render, Chart, OutputFormat};
use crate::{Config, Result};

/// Prints the nutritional status of weighed children by sex for a year, or one month of it.
///
/// # Errors
/// - Returns an error if the summary cannot be fetched or rendered.
pub async fn nutrition(
    config: Config,
    mode: Mode,
    args: NutritionArgs,
) -> Result<Out<GroupedCounts>> {
    let query = SummaryQuery {
        kind: SummaryKind::Nutrition,
        year: args.report().year(),
        month: args.month(),
    };
    summary(config, mode, query, "Nutritional Status", args.report().format()).await
}

/// Prints the vaccination status of residents by age group for a year.
///
/// # Errors
/// - Returns an error if the summary cannot be fetched or rendered.
pub async fn vaccination(
    config: Config,
    mode: Mode,
    args: ReportArgs,
) -> Result<Out<GroupedCounts>> {
    let query = SummaryQuery {
        kind: SummaryKind::Vaccination,
        year: args.year(),
        month: None,
    };
    summary(config, mode, query, "Vaccination Status", args.format()).await
}

async fn summary(
    config: Config,
    mode: Mode,
    query: SummaryQuery,
    label: &str,
    format: OutputFormat,
) -> Result<Out<GroupedCounts>> {
    let mut session = session(&config, mode).await?;
    let mut chart = Chart::new(match query.kind {
        SummaryKind::Nutrition => "nutrition",
        SummaryKind::Vaccination => "vaccination",
    });
    session.load_summary(&mut chart, query).await;

    let counts = match loaded(&chart)? {
        Some(counts) => counts,
        None => return Ok(format!("No data in the {query}").into()),
    };
    let output =
        render(format, &counts_table(label, counts), counts).pub_result(ErrorType::Report)?;
    let total: u64 = counts.rows().iter().map(|row| row.total).sum();
    Ok(Out::new(format!("{total} counted in the {query}"), counts.clone()).with_output(output))
}
