use super::{summary, ui};
use crate::core::series::FillReport;
use crate::core::valuation::ValuationReport;
use comfy_table::Cell;

/// Renders the day-by-day portfolio value table.
pub fn run(address: &str, report: &ValuationReport, fill: &FillReport) {
    println!(
        "Wallet: {}\n",
        ui::style_text(address, ui::StyleType::Title)
    );

    if report.snapshots.is_empty() {
        println!("No priced days to display.");
        summary::print_data_warnings(report, fill);
        return;
    }

    let currency = report.summary.currency;
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Balance (KAS)"),
        ui::header_cell(&format!("Price ({currency})")),
        ui::header_cell(&format!("Value ({currency})")),
    ]);

    for snapshot in &report.snapshots {
        table.add_row(vec![
            Cell::new(snapshot.date.to_string()),
            Cell::new(format!("{:.2}", snapshot.balance)),
            Cell::new(format!("{:.4}", snapshot.price)),
            Cell::new(format!("{:.2}", snapshot.value)),
        ]);
    }

    println!("{table}");

    if let (Some(first), Some(last)) = (report.snapshots.first(), report.snapshots.last()) {
        let change = last.value - first.value;
        println!(
            "\nValue {} → {}: {}",
            first.date,
            last.date,
            ui::style_text(
                &format!("{}{change:.2}", currency.symbol()),
                if change >= 0.0 {
                    ui::StyleType::TotalValue
                } else {
                    ui::StyleType::Error
                }
            )
        );
    }

    summary::print_data_warnings(report, fill);
}
