//! Price store persisted with fjall.
//!
//! Keys are `"<CURRENCY>/<YYYY-MM-DD>"`, so a lexicographic scan of one
//! currency prefix walks the dates in chronological order. Values are the
//! JSON-encoded price. A whole upsert batch commits through one keyspace
//! batch; either all points land or none do.

use crate::core::error::StoreError;
use crate::core::price::{Currency, PricePoint};
use crate::core::range::DateRange;
use crate::core::store::PriceStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

pub struct DiskPriceStore {
    keyspace: Keyspace,
    prices: PartitionHandle,
}

fn encode_key(date: NaiveDate, currency: Currency) -> String {
    format!("{currency}/{date}")
}

fn decode_key(key: &[u8]) -> Option<(Currency, NaiveDate)> {
    let key = std::str::from_utf8(key).ok()?;
    let (currency, date) = key.split_once('/')?;
    Some((currency.parse().ok()?, date.parse().ok()?))
}

impl DiskPriceStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;
        let keyspace = Config::new(path).open()?;
        let prices = keyspace.open_partition("prices", PartitionCreateOptions::default())?;
        Ok(Self { keyspace, prices })
    }

    fn stored_price(&self, key: &str) -> Result<Option<f64>, StoreError> {
        match self.prices.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl PriceStore for DiskPriceStore {
    async fn has(&self, date: NaiveDate, currency: Currency) -> Result<bool, StoreError> {
        Ok(self.prices.contains_key(encode_key(date, currency))?)
    }

    async fn known_dates(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        let mut dates = BTreeSet::new();
        let from = encode_key(range.start(), currency);
        let to = encode_key(range.end(), currency);
        for entry in self.prices.range(from..=to) {
            let (key, _) = entry?;
            if let Some((_, date)) = decode_key(&key) {
                dates.insert(date);
            }
        }
        Ok(dates)
    }

    async fn get_range(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let mut points = Vec::new();
        let from = encode_key(range.start(), currency);
        let to = encode_key(range.end(), currency);
        for entry in self.prices.range(from..=to) {
            let (key, value) = entry?;
            let Some((currency, date)) = decode_key(&key) else {
                debug!("Skipping undecodable price key");
                continue;
            };
            let price: f64 = serde_json::from_slice(&value)?;
            points.push(PricePoint::new(date, price, currency));
        }
        Ok(points)
    }

    async fn upsert(&self, points: &[PricePoint]) -> Result<usize, StoreError> {
        let mut batch = self.keyspace.batch();
        let mut written = 0;

        for point in points {
            let key = encode_key(point.date, point.currency);
            // Last write wins, but an identical value is not rewritten
            if self.stored_price(&key)? == Some(point.price) {
                continue;
            }
            batch.insert(&self.prices, key.as_bytes(), serde_json::to_vec(&point.price)?);
            written += 1;
        }

        if written > 0 {
            batch.commit()?;
            self.keyspace.persist(PersistMode::SyncAll)?;
        }
        debug!("Upserted {} of {} price points", written, points.len());
        Ok(written)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        let mut batch = self.keyspace.batch();
        for entry in self.prices.iter() {
            let (key, _) = entry?;
            batch.remove(&self.prices, key);
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }
}
