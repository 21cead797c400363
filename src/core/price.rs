//! Pricing abstractions and core types

use crate::core::error::FetchError;
use crate::core::range::DateRange;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Quote currency for price points. The upstream APIs serve both; the
/// display currency is picked in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
}

impl Currency {
    /// Lowercase code as the CoinGecko query parameter expects it.
    pub fn api_code(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Currency::Usd => "USD",
                Currency::Eur => "EUR",
            }
        )
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            _ => Err(anyhow::anyhow!("Unsupported currency: {}", s)),
        }
    }
}

/// One closing price for one calendar day. Unique per (date, currency) in
/// the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub currency: Currency,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64, currency: Currency) -> Self {
        Self {
            date,
            price,
            currency,
        }
    }
}

/// Daily closing prices for a date range from a live API.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch_range(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<Vec<PricePoint>, FetchError>;
}

/// A single live price point. Every call hits the network; nothing is
/// cached or persisted at this layer.
#[async_trait]
pub trait SpotProvider: Send + Sync {
    async fn fetch_spot(&self, currency: Currency) -> Result<PricePoint, FetchError>;
}

/// Offline dataset of date/price pairs for dates the free-tier API no
/// longer serves. Reads local data only.
pub trait ImportSource: Send + Sync {
    fn load_range(&self, range: DateRange, currency: Currency) -> Result<Vec<PricePoint>>;
}

/// Import source for setups without a backup file. Covers nothing.
pub struct NoImport;

impl ImportSource for NoImport {
    fn load_range(&self, _range: DateRange, _currency: Currency) -> Result<Vec<PricePoint>> {
        Ok(Vec::new())
    }
}
