//! Persistent price store contract.
//!
//! One instance is constructed per process and passed by reference to the
//! components that need it. Implementations live in `crate::store`.

use crate::core::error::StoreError;
use crate::core::price::{Currency, PricePoint};
use crate::core::range::DateRange;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Durable map of (date, currency) to price.
///
/// `upsert` is transactional per call: either the whole batch lands or none
/// of it does, and a repeated batch is a no-op. Writes are last-write-wins;
/// points identical to what is already stored are skipped and not counted.
#[async_trait]
pub trait PriceStore: Send + Sync {
    async fn has(&self, date: NaiveDate, currency: Currency) -> Result<bool, StoreError>;

    /// The dates inside `range` that already have a price.
    async fn known_dates(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<BTreeSet<NaiveDate>, StoreError>;

    /// Points inside `range`, sorted ascending by date. Dates without a
    /// price are simply absent; there is no padding.
    async fn get_range(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<Vec<PricePoint>, StoreError>;

    /// Writes a batch of points atomically and returns how many were
    /// actually written.
    async fn upsert(&self, points: &[PricePoint]) -> Result<usize, StoreError>;

    /// Drops all stored prices. Maintenance surface, not part of normal
    /// operation.
    async fn reset(&self) -> Result<(), StoreError>;
}
