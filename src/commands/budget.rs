use crate::api::Mode;
use crate::args::ReportArgs;
use crate::commands::{loaded, session, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::BudgetItems;
use crate::report::{budget_table, render, Chart};
use crate::{Config, Result};

/// Prints the budget items of a year with their proposed budgets.
///
/// # Errors
/// - Returns an error if the budget items cannot be fetched or rendered.
pub async fn budget(config: Config, mode: Mode, args: ReportArgs) -> Result<Out<BudgetItems>> {
    let year = args.year();
    let mut session = session(&config, mode).await?;
    let mut chart = Chart::new("budget");
    session.load_budget(&mut chart, year).await;

    let items = match loaded(&chart)? {
        Some(items) => items,
        None => return Ok(format!("No budget items found for {year}").into()),
    };
    let output =
        render(args.format(), &budget_table(items), items).pub_result(ErrorType::Report)?;
    Ok(Out::new(format!("{} budget item(s) for {year}", items.len()), items.clone())
        .with_output(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::OutputFormat;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_budget() {
        let env = TestEnv::new().await;
        let out = budget(
            env.config(),
            Mode::Test,
            ReportArgs::new(2024, OutputFormat::Table),
        )
        .await
        .unwrap();
        assert_eq!(out.structure().unwrap().len(), 5);
        assert_eq!(out.message(), "5 budget item(s) for 2024");
        assert!(out.output().unwrap().contains("Proposed Budget"));
    }

    #[tokio::test]
    async fn test_budget_empty_year() {
        let env = TestEnv::new().await;
        let out = budget(
            env.config(),
            Mode::Test,
            ReportArgs::new(1999, OutputFormat::Table),
        )
        .await
        .unwrap();
        assert_eq!(out.message(), "No budget items found for 1999");
    }
}
