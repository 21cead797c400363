use crate::core::transaction::{Direction, Transaction};
use anyhow::{Context, Result, anyhow};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use tracing::{debug, instrument};

const SOMPI_PER_KAS: f64 = 100_000_000.0;

/// Kaspa REST API client. Pulls the full transaction history for one
/// address and reduces each transaction to the net amount moved for that
/// address. No local caching; the history is rebuilt per request.
pub struct WalletClient {
    base_url: String,
    page_limit: usize,
}

#[derive(Deserialize, Debug)]
struct ApiTransaction {
    transaction_id: String,
    /// Milliseconds since epoch.
    block_time: Option<i64>,
    #[serde(default)]
    inputs: Vec<ApiInput>,
    #[serde(default)]
    outputs: Vec<ApiOutput>,
}

#[derive(Deserialize, Debug)]
struct ApiInput {
    previous_outpoint_address: Option<String>,
    previous_outpoint_amount: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct ApiOutput {
    script_public_key_address: Option<String>,
    amount: u64,
}

impl ApiTransaction {
    /// Net sompi moved for `address`: outputs paying the address minus
    /// inputs spending from it.
    fn net_sompi(&self, address: &str) -> i128 {
        let sent: u64 = self
            .inputs
            .iter()
            .filter(|input| input.previous_outpoint_address.as_deref() == Some(address))
            .filter_map(|input| input.previous_outpoint_amount)
            .sum();
        let received: u64 = self
            .outputs
            .iter()
            .filter(|output| output.script_public_key_address.as_deref() == Some(address))
            .map(|output| output.amount)
            .sum();
        i128::from(received) - i128::from(sent)
    }
}

impl WalletClient {
    pub fn new(base_url: &str) -> Self {
        WalletClient {
            base_url: base_url.to_string(),
            page_limit: 500,
        }
    }

    /// Full history for `address`, oldest first, with running balances.
    #[instrument(name = "WalletHistoryFetch", skip(self), fields(address = %address))]
    pub async fn fetch_transactions(&self, address: &str) -> Result<Vec<Transaction>> {
        let client = reqwest::Client::builder()
            .user_agent("kastrack/0.2")
            .build()?;

        let mut raw: Vec<ApiTransaction> = Vec::new();
        let mut before: Option<i64> = None;

        loop {
            let mut url = format!(
                "{}/addresses/{}/full-transactions?limit={}&resolve_previous_outpoints=light",
                self.base_url, address, self.page_limit
            );
            if let Some(ts) = before {
                url.push_str(&format!("&before={ts}"));
            }
            debug!("Requesting transactions from {}", url);

            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|e| anyhow!("Request error: {} for address: {}", e, address))?;
            if !response.status().is_success() {
                return Err(anyhow!(
                    "HTTP error: {} for address: {}",
                    response.status(),
                    address
                ));
            }

            let page = response
                .json::<Vec<ApiTransaction>>()
                .await
                .with_context(|| format!("Failed to parse transactions for {address}"))?;
            let page_len = page.len();
            let oldest = page.iter().filter_map(|tx| tx.block_time).min();
            raw.extend(page);

            if page_len < self.page_limit {
                break;
            }
            // Page again strictly before the oldest seen block time
            match oldest {
                Some(ts) if before.is_none_or(|prev| ts < prev) => before = Some(ts),
                _ => break,
            }
        }

        debug!("Fetched {} raw transaction(s)", raw.len());
        Ok(reduce_history(raw, address))
    }
}

/// Reduces raw API transactions to the wallet's net movements: zero-net
/// transactions (self-transfers, compounding) are dropped, the rest are
/// sorted oldest-first and get a cumulative running balance.
fn reduce_history(raw: Vec<ApiTransaction>, address: &str) -> Vec<Transaction> {
    let mut movements: Vec<(i64, String, f64)> = raw
        .into_iter()
        .filter_map(|tx| {
            let block_time = tx.block_time?;
            let net_kas = tx.net_sompi(address) as f64 / SOMPI_PER_KAS;
            (net_kas != 0.0).then_some((block_time, tx.transaction_id, net_kas))
        })
        .collect();
    movements.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut balance = 0.0;
    movements
        .into_iter()
        .filter_map(|(block_time, id, net_kas)| {
            balance += net_kas;
            let timestamp = Utc.timestamp_millis_opt(block_time).single()?;
            Some(Transaction {
                id,
                timestamp,
                direction: if net_kas < 0.0 {
                    Direction::Sent
                } else {
                    Direction::Received
                },
                amount: net_kas.abs(),
                running_balance: balance,
            })
        })
        .collect()
}
