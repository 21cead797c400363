//! In-memory price store for tests and ephemeral runs.

use crate::core::error::StoreError;
use crate::core::price::{Currency, PricePoint};
use crate::core::range::DateRange;
use crate::core::store::PriceStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryPriceStore {
    inner: Mutex<BTreeMap<(Currency, NaiveDate), f64>>,
}

impl MemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored points, across currencies.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl PriceStore for MemoryPriceStore {
    async fn has(&self, date: NaiveDate, currency: Currency) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.contains_key(&(currency, date)))
    }

    async fn known_dates(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<BTreeSet<NaiveDate>, StoreError> {
        let map = self.inner.lock().await;
        Ok(map
            .range((currency, range.start())..=(currency, range.end()))
            .map(|((_, date), _)| *date)
            .collect())
    }

    async fn get_range(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<Vec<PricePoint>, StoreError> {
        let map = self.inner.lock().await;
        Ok(map
            .range((currency, range.start())..=(currency, range.end()))
            .map(|((currency, date), price)| PricePoint::new(*date, *price, *currency))
            .collect())
    }

    async fn upsert(&self, points: &[PricePoint]) -> Result<usize, StoreError> {
        let mut map = self.inner.lock().await;
        let mut written = 0;
        for point in points {
            let key = (point.currency, point.date);
            if map.get(&key) == Some(&point.price) {
                continue;
            }
            map.insert(key, point.price);
            written += 1;
        }
        Ok(written)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.inner.lock().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_idempotence_and_order() {
        let store = MemoryPriceStore::new();
        let batch = vec![
            PricePoint::new(d("2024-01-02"), 0.11, Currency::Usd),
            PricePoint::new(d("2024-01-01"), 0.10, Currency::Usd),
        ];

        assert_eq!(store.upsert(&batch).await.unwrap(), 2);
        assert_eq!(store.upsert(&batch).await.unwrap(), 0);
        assert_eq!(store.len().await, 2);

        let range = DateRange::new(d("2024-01-01"), d("2024-01-02")).unwrap();
        let got = store.get_range(range, Currency::Usd).await.unwrap();
        assert_eq!(got[0].date, d("2024-01-01"));
        assert_eq!(got[1].date, d("2024-01-02"));
    }

    #[tokio::test]
    async fn test_range_excludes_other_currency() {
        let store = MemoryPriceStore::new();
        store
            .upsert(&[
                PricePoint::new(d("2024-01-01"), 0.10, Currency::Usd),
                PricePoint::new(d("2024-01-01"), 0.09, Currency::Eur),
            ])
            .await
            .unwrap();

        let range = DateRange::single(d("2024-01-01"));
        let usd = store.get_range(range, Currency::Usd).await.unwrap();
        assert_eq!(usd.len(), 1);
        assert_eq!(usd[0].currency, Currency::Usd);
    }
}
