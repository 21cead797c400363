//! CSV report writer over the core's transaction and snapshot sequences.

use crate::core::price::PricePoint;
use crate::core::transaction::{Direction, Transaction};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    date: String,
    sent_amount: Option<f64>,
    received_amount: Option<f64>,
    balance: f64,
    price: Option<f64>,
    value: Option<f64>,
    transaction_id: &'a str,
}

/// Writes one row per transaction, priced with the nearest earlier day's
/// price. A transaction no source could price gets empty price/value
/// cells rather than a made-up number. Returns the number of rows.
pub fn write_report(
    path: &Path,
    transactions: &[Transaction],
    prices: &[PricePoint],
) -> Result<usize> {
    let by_date: BTreeMap<NaiveDate, f64> = prices.iter().map(|p| (p.date, p.price)).collect();

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;

    for tx in transactions {
        let price = by_date
            .range(..=tx.date())
            .next_back()
            .map(|(_, price)| *price);
        let (sent, received) = match tx.direction {
            Direction::Sent => (Some(tx.amount), None),
            Direction::Received => (None, Some(tx.amount)),
        };
        writer.serialize(ReportRow {
            date: tx.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            sent_amount: sent,
            received_amount: received,
            balance: tx.running_balance,
            price,
            value: price.map(|p| tx.running_balance * p),
            transaction_id: &tx.id,
        })?;
    }
    writer.flush()?;
    Ok(transactions.len())
}
