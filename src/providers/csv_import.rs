use crate::core::price::{Currency, ImportSource, PricePoint};
use crate::core::range::DateRange;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Offline price backup: a CSV with `date` (YYYY-MM-DD) and `price`
/// columns, denominated in a single currency. Used for dates the
/// free-tier API no longer serves; the file is read on demand and never
/// written.
pub struct CsvImportSource {
    path: PathBuf,
    currency: Currency,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    price: f64,
}

impl CsvImportSource {
    pub fn new<P: AsRef<Path>>(path: P, currency: Currency) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            currency,
        }
    }
}

impl ImportSource for CsvImportSource {
    fn load_range(&self, range: DateRange, currency: Currency) -> Result<Vec<PricePoint>> {
        if currency != self.currency {
            debug!(
                "Import file is denominated in {}, no coverage for {}",
                self.currency, currency
            );
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open import file: {}", self.path.display()))?;

        let mut points = Vec::new();
        for row in reader.deserialize() {
            let row: CsvRow = row
                .with_context(|| format!("Malformed row in {}", self.path.display()))?;
            if range.contains(row.date) {
                points.push(PricePoint::new(row.date, row.price, currency));
            }
        }
        points.sort_by_key(|p| p.date);
        debug!(
            "Import file covers {} of {} day(s) in {}",
            points.len(),
            range.num_days(),
            range
        );
        Ok(points)
    }
}
