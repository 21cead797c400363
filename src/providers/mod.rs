pub mod coingecko;
pub mod csv_import;
pub mod kaspa;

pub use coingecko::CoinGeckoProvider;
pub use csv_import::CsvImportSource;
pub use kaspa::WalletClient;
