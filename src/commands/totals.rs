use crate::api::Mode;
use crate::args::ReportArgs;
use crate::commands::{loaded, session, with_diagnostics, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Amount;
use crate::report::{render, totals_table, Chart, QuarterTotals};
use crate::{Config, Result};

/// Prints income, expense and net for each quarter of a year and for the whole year.
///
/// # Errors
/// - Returns an error if the records cannot be fetched or the report cannot be rendered.
pub async fn totals(config: Config, mode: Mode, args: ReportArgs) -> Result<Out<QuarterTotals>> {
    let year = args.year();
    let mut session = session(&config, mode).await?;
    let mut chart = Chart::new("totals");
    session.load_totals(&mut chart, year).await;

    let totals = match loaded(&chart)? {
        Some(totals) => totals,
        None => return Ok(format!("No income or expense records found for {year}").into()),
    };
    let net = totals.year().net;
    let message = with_diagnostics(
        format!("Net income for {year} is {}", Amount::new(net)),
        totals.diagnostics(),
    );
    let output = render(args.format(), &totals_table(totals), totals)
        .pub_result(ErrorType::Report)?;
    Ok(Out::new(message, totals.clone()).with_output(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Quarter;
    use crate::report::OutputFormat;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_totals() {
        let env = TestEnv::new().await;
        let out = totals(
            env.config(),
            Mode::Test,
            ReportArgs::new(2024, OutputFormat::Table),
        )
        .await
        .unwrap();
        let totals = out.structure().unwrap();
        assert_eq!(totals.rows().len(), 4);
        let q1 = &totals.rows()[0];
        assert_eq!(q1.quarter, Some(Quarter::Q1));
        assert_eq!(q1.income, Decimal::from(120000));
        assert_eq!(q1.expense, Decimal::from(39050));
        assert_eq!(q1.net, Decimal::from(80950));
        let output = out.output().unwrap();
        assert!(output.contains("| Total"));
    }

    #[tokio::test]
    async fn test_totals_empty_year() {
        let env = TestEnv::new().await;
        let out = totals(
            env.config(),
            Mode::Test,
            ReportArgs::new(2001, OutputFormat::Csv),
        )
        .await
        .unwrap();
        assert!(out.structure().is_none());
        assert_eq!(out.message(), "No income or expense records found for 2001");
    }
}
