//! Assembles a complete daily price series for a date range.
//!
//! The pipeline is: ask the store which dates are known, compute the
//! missing runs, route each run to the live API (inside the free-tier
//! window) or the offline import (strictly older), persist whatever was
//! obtained, then recompute the gaps from the store rather than assuming
//! the fetches succeeded. Partial coverage is an outcome the caller can
//! act on, not an error.

use crate::core::error::{FetchError, StoreError};
use crate::core::price::{Currency, HistoryProvider, ImportSource};
use crate::core::range::{DateRange, find_gaps};
use crate::core::store::PriceStore;
use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

/// What a fill pass achieved for one requested range.
#[derive(Debug, Default)]
pub struct FillReport {
    /// Points obtained from the live API.
    pub fetched: usize,
    /// Points obtained from the offline import.
    pub imported: usize,
    /// Runs of days still unpriced after the pass. Retried on the next
    /// request; never fabricated.
    pub open_gaps: Vec<DateRange>,
    /// The live API throttled us during this pass. The user decides when
    /// to try again; nothing is retried silently.
    pub rate_limited: bool,
}

impl FillReport {
    pub fn is_complete(&self) -> bool {
        self.open_gaps.is_empty()
    }
}

pub struct PriceSeriesService<'a> {
    history: &'a dyn HistoryProvider,
    import: &'a dyn ImportSource,
    /// Trailing number of days, ending today, the live API serves on the
    /// free tier.
    window_days: u32,
}

impl<'a> PriceSeriesService<'a> {
    pub fn new(
        history: &'a dyn HistoryProvider,
        import: &'a dyn ImportSource,
        window_days: u32,
    ) -> Self {
        Self {
            history,
            import,
            window_days,
        }
    }

    /// First day the live API still serves: `today - (window_days - 1)`.
    fn window_start(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(self.window_days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Ensures the store covers `requested` as far as the sources allow,
    /// and reports what remains open.
    pub async fn ensure_range(
        &self,
        store: &dyn PriceStore,
        requested: DateRange,
        currency: Currency,
        today: NaiveDate,
    ) -> Result<FillReport, StoreError> {
        let known = store.known_dates(requested, currency).await?;
        let gaps = find_gaps(requested, &known, today);
        if gaps.is_empty() {
            debug!("Price store already covers {}", requested);
            return Ok(FillReport::default());
        }

        let window = self.window_start(today);
        let mut report = FillReport::default();

        for gap in gaps {
            self.fill_gap(store, gap, currency, window, &mut report)
                .await?;
            if report.rate_limited {
                break;
            }
        }

        // Re-derive coverage from the store; a failed or partial fetch
        // must leave its days visibly open, not assumed filled.
        let known = store.known_dates(requested, currency).await?;
        report.open_gaps = find_gaps(requested, &known, today);
        if !report.open_gaps.is_empty() {
            warn!(
                "{} day(s) in {} remain unpriced",
                report
                    .open_gaps
                    .iter()
                    .map(DateRange::num_days)
                    .sum::<i64>(),
                requested
            );
        }
        Ok(report)
    }

    async fn fill_gap(
        &self,
        store: &dyn PriceStore,
        gap: DateRange,
        currency: Currency,
        window_start: NaiveDate,
        report: &mut FillReport,
    ) -> Result<(), StoreError> {
        // Days strictly before the window can only come from the import;
        // days inside it only from the live API.
        if let Some(old_end) = window_start.pred_opt()
            && let Some(older) = gap.clamp_end(old_end)
        {
            match self.import.load_range(older, currency) {
                Ok(points) if points.is_empty() => {
                    debug!("Import has no coverage for {}", older);
                }
                Ok(points) => {
                    report.imported += store.upsert(&points).await?;
                    info!("Imported {} price point(s) for {}", points.len(), older);
                }
                Err(e) => warn!("Price import failed for {}: {}", older, e),
            }
        }

        if gap.end() >= window_start {
            let live = DateRange::new(gap.start().max(window_start), gap.end())
                .expect("window split keeps start <= end");
            match self.history.fetch_range(live, currency).await {
                Ok(points) => {
                    report.fetched += store.upsert(&points).await?;
                    info!("Fetched {} price point(s) for {}", points.len(), live);
                }
                Err(FetchError::RateLimited) => {
                    warn!("Price API rate limited; stopping fetches for this request");
                    report.rate_limited = true;
                }
                Err(e) => warn!("Price fetch failed for {}: {}", live, e),
            }
        }
        Ok(())
    }
}
