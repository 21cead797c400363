//! Joins the balance history with the assembled price series into a
//! portfolio value series and summary figures.
//!
//! Gap policy: a date inside the requested range with no price is omitted
//! from the snapshot series and reported in `missing_dates`. Prices are
//! never interpolated or zero-filled here; smoothing a chart is a display
//! concern, not a valuation one.

use crate::core::price::{Currency, PricePoint};
use crate::core::range::DateRange;
use crate::core::transaction::{Direction, Transaction, transfer_totals};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Portfolio state at the end of one day. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub balance: f64,
    pub price: f64,
    pub value: f64,
}

/// Scalar summary over the whole history.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationSummary {
    pub total_received: f64,
    pub total_sent: f64,
    pub current_balance: f64,
    pub currency: Currency,
    /// Receive-amount-weighted average acquisition price. None when no
    /// receive could be priced.
    pub average_buy_price: Option<f64>,
    /// The price used for the current-value figures, and whether it came
    /// from the live spot API or fell back to the newest stored price.
    pub current_price: Option<f64>,
    pub spot_is_live: bool,
    pub current_value: Option<f64>,
    pub unrealized_pnl: Option<f64>,
    /// Price at which selling the remaining balance recovers the net
    /// amount spent. Negative when sends already repaid the cost.
    pub break_even_price: Option<f64>,
}

#[derive(Debug)]
pub struct ValuationReport {
    /// One snapshot per priced day in the requested range, ascending.
    pub snapshots: Vec<PortfolioSnapshot>,
    /// Days in the requested range that still have no resolvable price.
    pub missing_dates: Vec<NaiveDate>,
    pub summary: ValuationSummary,
}

/// Produces the value series and summary for one wallet.
///
/// `transactions` must be sorted ascending with running balances set;
/// `prices` is the assembled series for the display currency. `spot` is
/// the live price if one could be fetched; otherwise the newest price in
/// the series stands in for it.
pub fn valuate(
    transactions: &[Transaction],
    prices: &[PricePoint],
    requested: DateRange,
    currency: Currency,
    spot: Option<f64>,
) -> ValuationReport {
    let by_date: BTreeMap<NaiveDate, f64> =
        prices.iter().map(|p| (p.date, p.price)).collect();

    let mut snapshots = Vec::new();
    let mut missing_dates = Vec::new();

    // Walk the requested days against the price series, carrying the
    // balance forward as a step function. Days before the first
    // transaction are valid zero-balance snapshots.
    let mut balance = 0.0;
    let mut txs = transactions.iter().peekable();
    for date in requested.iter_days() {
        while let Some(tx) = txs.peek() {
            if tx.date() <= date {
                balance = tx.running_balance;
                txs.next();
            } else {
                break;
            }
        }
        match by_date.get(&date) {
            Some(price) => snapshots.push(PortfolioSnapshot {
                date,
                balance,
                price: *price,
                value: balance * price,
            }),
            None => missing_dates.push(date),
        }
    }

    let totals = transfer_totals(transactions);
    let basis = cost_basis(transactions, &by_date);

    let fallback_price = prices.last().map(|p| p.price);
    let current_price = spot.or(fallback_price);
    let current_value = current_price.map(|p| totals.balance * p);
    let unrealized_pnl = match (current_price, basis.average_buy_price) {
        (Some(price), Some(avg)) => Some(totals.balance * (price - avg)),
        _ => None,
    };

    debug!(
        snapshots = snapshots.len(),
        missing = missing_dates.len(),
        "Valuation assembled"
    );

    ValuationReport {
        snapshots,
        missing_dates,
        summary: ValuationSummary {
            total_received: totals.received,
            total_sent: totals.sent,
            current_balance: totals.balance,
            currency,
            average_buy_price: basis.average_buy_price,
            current_price,
            spot_is_live: spot.is_some(),
            current_value,
            unrealized_pnl,
            break_even_price: basis.break_even_price(totals.balance),
        },
    }
}

struct CostBasis {
    average_buy_price: Option<f64>,
    cost_of_receives: f64,
    proceeds_of_sends: f64,
    priced_all: bool,
}

impl CostBasis {
    /// (cost of receives - proceeds of sends) / balance: the spot price at
    /// which liquidating the remaining balance breaks even. Suppressed
    /// when the balance is gone or some transfer could not be priced.
    fn break_even_price(&self, balance: f64) -> Option<f64> {
        if balance <= 0.0 || !self.priced_all || self.average_buy_price.is_none() {
            return None;
        }
        Some((self.cost_of_receives - self.proceeds_of_sends) / balance)
    }
}

/// Average-cost model: every receive contributes its day's price weighted
/// by the received amount; sends never adjust the basis. A transfer on a
/// day with no stored price uses the nearest earlier price, and is left
/// out when none exists.
fn cost_basis(transactions: &[Transaction], prices: &BTreeMap<NaiveDate, f64>) -> CostBasis {
    let mut weighted_cost = 0.0;
    let mut received_units = 0.0;
    let mut proceeds_of_sends = 0.0;
    let mut priced_all = true;

    for tx in transactions {
        let Some(price) = price_at_or_before(prices, tx.date()) else {
            debug!("No price on or before {} for {}", tx.date(), tx.id);
            priced_all = false;
            continue;
        };
        match tx.direction {
            Direction::Received => {
                weighted_cost += tx.amount * price;
                received_units += tx.amount;
            }
            Direction::Sent => proceeds_of_sends += tx.amount * price,
        }
    }

    CostBasis {
        average_buy_price: (received_units > 0.0).then(|| weighted_cost / received_units),
        cost_of_receives: weighted_cost,
        proceeds_of_sends,
        priced_all,
    }
}

fn price_at_or_before(prices: &BTreeMap<NaiveDate, f64>, date: NaiveDate) -> Option<f64> {
    prices.range(..=date).next_back().map(|(_, price)| *price)
}
