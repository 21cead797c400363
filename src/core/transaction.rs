//! Wallet transaction model.
//!
//! Transactions arrive from the Kaspa API collaborator already sorted
//! ascending by block time, with the running balance precomputed as the
//! cumulative sum of signed amounts. The core treats them as read-only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Received,
    Sent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    /// Magnitude in KAS, non-negative; the sign lives in `direction`.
    pub amount: f64,
    pub running_balance: f64,
}

impl Transaction {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Amount with its sign applied.
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            Direction::Received => self.amount,
            Direction::Sent => -self.amount,
        }
    }
}

/// Lifetime received/sent sums and the final balance.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransferTotals {
    pub received: f64,
    pub sent: f64,
    pub balance: f64,
}

pub fn transfer_totals(transactions: &[Transaction]) -> TransferTotals {
    let mut totals = TransferTotals::default();
    for tx in transactions {
        match tx.direction {
            Direction::Received => totals.received += tx.amount,
            Direction::Sent => totals.sent += tx.amount,
        }
    }
    totals.balance = transactions.last().map_or(0.0, |tx| tx.running_balance);
    totals
}

/// Balance held at the end of `date`: the running balance of the latest
/// transaction at or before that day, carried forward as a step function.
/// Zero before the first transaction.
pub fn balance_on(transactions: &[Transaction], date: NaiveDate) -> f64 {
    transactions
        .iter()
        .rev()
        .find(|tx| tx.date() <= date)
        .map_or(0.0, |tx| tx.running_balance)
}
