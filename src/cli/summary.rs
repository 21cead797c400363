use super::ui;
use crate::core::series::FillReport;
use crate::core::valuation::ValuationReport;
use comfy_table::Cell;

/// Renders the wallet summary panel: holdings, live value, and
/// profit/loss figures.
pub fn run(address: &str, report: &ValuationReport, fill: &FillReport) {
    let summary = &report.summary;
    let currency = summary.currency;

    println!(
        "Wallet: {}\n",
        ui::style_text(address, ui::StyleType::Title)
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

    table.add_row(vec![
        Cell::new("Current Balance"),
        Cell::new(format!("{:.2} KAS", summary.current_balance)),
    ]);

    let price_label = if summary.spot_is_live {
        "Current Price"
    } else {
        "Current Price (last known)"
    };
    table.add_row(vec![
        Cell::new(price_label),
        ui::format_optional_cell(summary.current_price, |p| {
            format!("{}{p:.4}", currency.symbol())
        }),
    ]);
    table.add_row(vec![
        Cell::new(format!("Current Value ({currency})")),
        ui::format_optional_cell(summary.current_value, |v| {
            format!("{}{v:.2}", currency.symbol())
        }),
    ]);
    table.add_row(vec![
        Cell::new("Total Received"),
        Cell::new(format!("{:.2} KAS", summary.total_received)),
    ]);
    table.add_row(vec![
        Cell::new("Total Sent"),
        Cell::new(format!("{:.2} KAS", summary.total_sent)),
    ]);
    table.add_row(vec![
        Cell::new("Average Buy Price"),
        ui::format_optional_cell(summary.average_buy_price, |p| {
            format!("{}{p:.4}", currency.symbol())
        }),
    ]);
    table.add_row(vec![
        Cell::new("Unrealized P/L"),
        match summary.unrealized_pnl {
            Some(pnl) => ui::signed_cell(pnl, format!("{}{pnl:.2}", currency.symbol())),
            None => ui::format_optional_cell(None::<f64>, |_: f64| String::new()),
        },
    ]);
    table.add_row(vec![
        Cell::new("Break-even Price"),
        ui::format_optional_cell(summary.break_even_price, |p| {
            format!("{}{p:.4}", currency.symbol())
        }),
    ]);

    println!("{table}");

    print_data_warnings(report, fill);
}

/// Shared footer: rate limiting and unpriced days are user-visible
/// conditions, never silent.
pub fn print_data_warnings(report: &ValuationReport, fill: &FillReport) {
    if fill.rate_limited {
        println!(
            "\n{}",
            ui::style_text(
                "Price API rate limit reached; some days were not refreshed. Re-run in a minute.",
                ui::StyleType::Error
            )
        );
    }
    if !report.missing_dates.is_empty() {
        println!(
            "\n{}",
            ui::style_text(
                &format!(
                    "{} day(s) have no price from any source and were omitted: {}",
                    report.missing_dates.len(),
                    summarize_dates(&report.missing_dates)
                ),
                ui::StyleType::Subtle
            )
        );
    }
}

fn summarize_dates(dates: &[chrono::NaiveDate]) -> String {
    const SHOWN: usize = 5;
    let listed: Vec<String> = dates.iter().take(SHOWN).map(|d| d.to_string()).collect();
    if dates.len() > SHOWN {
        format!("{}, … ({} more)", listed.join(", "), dates.len() - SHOWN)
    } else {
        listed.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_summarize_dates_truncates() {
        let few = vec![d("2024-01-01"), d("2024-01-02")];
        assert_eq!(summarize_dates(&few), "2024-01-01, 2024-01-02");

        let many: Vec<NaiveDate> = (1..=8)
            .map(|day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap())
            .collect();
        let text = summarize_dates(&many);
        assert!(text.contains("2024-01-05"));
        assert!(text.contains("(3 more)"));
        assert!(!text.contains("2024-01-06"));
    }
}
