pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::ui;
use crate::core::config::AppConfig;
use crate::core::price::{ImportSource, NoImport, SpotProvider};
use crate::core::range::DateRange;
use crate::core::series::PriceSeriesService;
use crate::core::store::PriceStore;
use crate::core::valuation::valuate;
use crate::providers::{CoinGeckoProvider, CsvImportSource, WalletClient};
use crate::store::DiskPriceStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Summary,
    History,
    Export { output: PathBuf },
    Reset,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Kaspa tracker starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.default_data_path()?;
    let store =
        DiskPriceStore::open(&data_path.join("prices")).context("Failed to open price store")?;

    if let AppCommand::Reset = command {
        store.reset().await?;
        println!("Price database cleared.");
        return Ok(());
    }

    let coingecko = match &config.providers.coingecko {
        Some(p) => CoinGeckoProvider::new(&p.base_url, &p.coin_id, p.api_key.clone()),
        None => CoinGeckoProvider::new("https://api.coingecko.com/api/v3", "kaspa", None),
    };
    let wallet_base = config
        .providers
        .kaspa
        .as_ref()
        .map_or("https://api.kaspa.org", |p| &p.base_url);
    let wallet = WalletClient::new(wallet_base);

    let import: Box<dyn ImportSource> = match &config.import {
        Some(import) => Box::new(CsvImportSource::new(&import.path, config.currency)),
        None => Box::new(NoImport),
    };
    let service = PriceSeriesService::new(&coingecko, import.as_ref(), config.history_window_days);

    // Transaction history first: it decides the date range to price
    let pb = ui::new_spinner("Fetching wallet transactions...");
    let transactions = wallet.fetch_transactions(&config.address).await;
    pb.finish_and_clear();
    let transactions =
        transactions.with_context(|| format!("Failed to fetch history for {}", config.address))?;

    let Some(first) = transactions.first() else {
        println!("No transactions found for {}", config.address);
        return Ok(());
    };

    let today = Utc::now().date_naive();
    let range = DateRange::new(first.date().min(today), today)?;
    debug!("Pricing range {} for {} transaction(s)", range, transactions.len());

    let pb = ui::new_spinner("Updating price history...");
    let fill = service
        .ensure_range(&store, range, config.currency, today)
        .await?;
    pb.finish_and_clear();

    let prices = store.get_range(range, config.currency).await?;

    let spot = match coingecko.fetch_spot(config.currency).await {
        Ok(point) => Some(point.price),
        Err(e) => {
            warn!("Spot price unavailable, falling back to last known: {}", e);
            None
        }
    };

    let report = valuate(&transactions, &prices, range, config.currency, spot);

    match command {
        AppCommand::Summary => cli::summary::run(&config.address, &report, &fill),
        AppCommand::History => cli::history::run(&config.address, &report, &fill),
        AppCommand::Export { output } => {
            let rows = cli::export::write_report(&output, &transactions, &prices)?;
            println!("Wrote {} row(s) to {}", rows, output.display());
            cli::summary::print_data_warnings(&report, &fill);
        }
        AppCommand::Reset => unreachable!("Reset is handled before any fetch"),
    }

    Ok(())
}
