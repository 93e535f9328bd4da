use crate::api::Mode;
use crate::args::ExpensesArgs;
use crate::commands::{loaded, session, with_diagnostics, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Quarter;
use crate::report::{
    expense_table, render, slice_table, Diagnostics, ExpenseChart, ExpenseChartData,
    QuarterSliceRow,
};
use crate::{Config, Result};
use serde::Serialize;

/// The data behind the `expenses` output.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Expenses {
    /// Every budget item with all four quarters.
    Year(ExpenseChartData),
    /// The budget items with spending in one quarter.
    Quarter {
        quarter: Quarter,
        rows: Vec<QuarterSliceRow>,
        diagnostics: Diagnostics,
    },
}

/// Prints the expenses of a year per budget item and quarter. With a quarter selected only the
/// items that had spending in that quarter are printed.
///
/// # Arguments
/// - `config` - The loaded configuration.
/// - `mode` - Whether to use the HTTP backend or seeded test data.
/// - `args` - The year, optional quarter and output format.
///
/// # Errors
/// - Returns an error if the records or budget items cannot be fetched, or the report cannot be
///   rendered.
pub async fn expenses(config: Config, mode: Mode, args: ExpensesArgs) -> Result<Out<Expenses>> {
    let year = args.report().year();
    let format = args.report().format();
    let mut session = session(&config, mode).await?;
    let mut chart = ExpenseChart::default();
    session.load_expenses(&mut chart, year).await;
    chart.select_quarter(args.quarter());

    let data = match loaded(chart.chart())? {
        Some(data) => data,
        None => return Ok(format!("No expense records found for {year}").into()),
    };
    let diagnostics = data.report.diagnostics();

    match (chart.quarter(), chart.slice()) {
        (Some(quarter), Some(rows)) => {
            if rows.is_empty() {
                let message = format!("No spending in {quarter} {year}");
                return Ok(with_diagnostics(message, diagnostics).into());
            }
            let message = with_diagnostics(
                format!("{} budget item(s) with spending in {quarter} {year}", rows.len()),
                diagnostics,
            );
            let table = slice_table(quarter, &rows);
            let structure = Expenses::Quarter {
                quarter,
                rows,
                diagnostics: diagnostics.clone(),
            };
            let output = render(format, &table, &structure).pub_result(ErrorType::Report)?;
            Ok(Out::new(message, structure).with_output(output))
        }
        _ => {
            let message = with_diagnostics(
                format!(
                    "{} budget item(s) in the expenses of {year}",
                    data.report.rows().len()
                ),
                diagnostics,
            );
            let table = expense_table(&data.report, &data.budget);
            let structure = Expenses::Year(data.clone());
            let output = render(format, &table, &structure).pub_result(ErrorType::Report)?;
            Ok(Out::new(message, structure).with_output(output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ReportArgs;
    use crate::report::OutputFormat;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;

    fn args(year: i32, quarter: Option<Quarter>, format: OutputFormat) -> ExpensesArgs {
        ExpensesArgs::new(ReportArgs::new(year, format), quarter)
    }

    #[tokio::test]
    async fn test_expenses_year() {
        let env = TestEnv::new().await;
        let out = expenses(env.config(), Mode::Test, args(2024, None, OutputFormat::Table))
            .await
            .unwrap();
        let data = match out.structure().unwrap() {
            Expenses::Year(data) => data,
            other => panic!("expected the year report, got {other:?}"),
        };
        let supplies = data.report.row("Office Supplies").unwrap();
        assert_eq!(supplies.get(Quarter::Q1), Decimal::from(15250));
        assert_eq!(supplies.get(Quarter::Q2), Decimal::from(500));
        assert!(!supplies.contains(Quarter::Q3));
        assert!(out.message().contains("1 record(s) skipped"));
        let output = out.output().unwrap();
        assert!(output.starts_with("| Budget Item"));
        assert!(output.contains("₱15,250.00"));
    }

    #[tokio::test]
    async fn test_expenses_quarter() {
        let env = TestEnv::new().await;
        let out = expenses(
            env.config(),
            Mode::Test,
            args(2024, Some(Quarter::Q3), OutputFormat::Csv),
        )
        .await
        .unwrap();
        match out.structure().unwrap() {
            Expenses::Quarter { quarter, rows, .. } => {
                assert_eq!(*quarter, Quarter::Q3);
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].budget_item, "Infrastructure");
                assert_eq!(rows[0].amount, "38950.75".parse::<Decimal>().unwrap());
            }
            other => panic!("expected a quarter slice, got {other:?}"),
        }
        assert!(out.output().unwrap().starts_with("Budget Item,Q3,Proposed Budget\n"));
    }

    #[tokio::test]
    async fn test_expenses_empty_year() {
        let env = TestEnv::new().await;
        let out = expenses(env.config(), Mode::Test, args(2019, None, OutputFormat::Table))
            .await
            .unwrap();
        assert_eq!(out.message(), "No expense records found for 2019");
        assert!(out.output().is_none());
    }

    #[tokio::test]
    async fn test_expenses_json() {
        let env = TestEnv::new().await;
        let out = expenses(
            env.config(),
            Mode::Test,
            args(2024, Some(Quarter::Q1), OutputFormat::Json),
        )
        .await
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(out.output().unwrap()).unwrap();
        assert_eq!(json["quarter"], "Q1");
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
    }
}
