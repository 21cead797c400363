//! Core business logic abstractions

pub mod config;
pub mod error;
pub mod log;
pub mod price;
pub mod range;
pub mod series;
pub mod store;
pub mod transaction;
pub mod valuation;

// Re-export main types for cleaner imports
pub use error::{FetchError, StoreError};
pub use price::{Currency, HistoryProvider, ImportSource, PricePoint, SpotProvider};
pub use range::{DateRange, find_gaps};
pub use series::{FillReport, PriceSeriesService};
pub use store::PriceStore;
pub use transaction::{Direction, Transaction};
pub use valuation::{PortfolioSnapshot, ValuationReport, ValuationSummary, valuate};
