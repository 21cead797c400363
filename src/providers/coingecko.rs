use crate::core::error::FetchError;
use crate::core::price::{Currency, HistoryProvider, PricePoint, SpotProvider};
use crate::core::range::DateRange;
use async_trait::async_trait;
use chrono::{NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

const DEMO_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko client for one coin. Serves both the historical range
/// endpoint and the live spot endpoint. The free tier throttles hard and
/// only keeps a trailing window of daily history; 429s surface as
/// `RateLimited` and are never retried here.
pub struct CoinGeckoProvider {
    base_url: String,
    coin_id: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, coin_id: &str, api_key: Option<String>) -> Self {
        CoinGeckoProvider {
            base_url: base_url.to_string(),
            coin_id: coin_id.to_string(),
            api_key,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("kastrack/0.2")
            .build()
            .map_err(FetchError::unavailable)?;

        let mut request = client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(DEMO_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::unavailable(format!("Request error: {e} URL: {url}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Unavailable(format!("HTTP error: {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::unavailable(format!("Failed to parse response: {e}")))
    }
}

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    /// Pairs of millisecond timestamp and price.
    prices: Vec<(i64, f64)>,
}

#[async_trait]
impl HistoryProvider for CoinGeckoProvider {
    #[instrument(
        name = "CoinGeckoHistoryFetch",
        skip(self),
        fields(range = %range, currency = %currency)
    )]
    async fn fetch_range(
        &self,
        range: DateRange,
        currency: Currency,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let from_ts = range.start().and_time(NaiveTime::MIN).and_utc().timestamp();
        // One day past the end so the last day's sample is included
        let to_ts = range
            .end()
            .succ_opt()
            .unwrap_or(range.end())
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();

        let url = format!(
            "{}/coins/{}/market_chart/range?vs_currency={}&from={}&to={}",
            self.base_url,
            self.coin_id,
            currency.api_code(),
            from_ts,
            to_ts
        );
        debug!("Requesting price history from {}", url);

        let data: MarketChartResponse = self.get_json(&url).await?;

        // Collapse samples to one close per calendar day; the endpoint
        // returns hourly bars for short ranges and the last sample of a
        // day stands in for its close.
        let mut by_date: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
        for (ts_ms, price) in data.prices {
            let Some(instant) = Utc.timestamp_millis_opt(ts_ms).single() else {
                debug!("Skipping sample with invalid timestamp {}", ts_ms);
                continue;
            };
            let date = instant.date_naive();
            if range.contains(date) {
                by_date.insert(date, price);
            }
        }

        Ok(by_date
            .into_iter()
            .map(|(date, price)| PricePoint::new(date, price, currency))
            .collect())
    }
}

#[async_trait]
impl SpotProvider for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoSpotFetch", skip(self), fields(currency = %currency))]
    async fn fetch_spot(&self, currency: Currency) -> Result<PricePoint, FetchError> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            self.coin_id,
            currency.api_code()
        );
        debug!("Requesting spot price from {}", url);

        let data: HashMap<String, HashMap<String, f64>> = self.get_json(&url).await?;
        let price = data
            .get(&self.coin_id)
            .and_then(|quotes| quotes.get(currency.api_code()))
            .copied()
            .ok_or_else(|| {
                FetchError::Unavailable(format!("No spot price found for coin: {}", self.coin_id))
            })?;

        Ok(PricePoint::new(Utc::now().date_naive(), price, currency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn ms(date: &str, hour: u32) -> i64 {
        d(date)
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    async fn mount_chart(server: &MockServer, coin: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/coins/{coin}/market_chart/range")))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_history_fetch_collapses_to_daily_closes() {
        let mock_server = MockServer::start().await;
        let body = format!(
            r#"{{"prices": [
                [{}, 0.101], [{}, 0.105],
                [{}, 0.110],
                [{}, 0.999]
            ]}}"#,
            ms("2024-01-01", 3),
            ms("2024-01-01", 21),
            ms("2024-01-02", 12),
            // Padding sample past the requested range: must be dropped
            ms("2024-01-03", 0),
        );
        mount_chart(
            &mock_server,
            "kaspa",
            ResponseTemplate::new(200).set_body_string(body),
        )
        .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "kaspa", None);
        let range = DateRange::new(d("2024-01-01"), d("2024-01-02")).unwrap();
        let points = provider.fetch_range(range, Currency::Usd).await.unwrap();

        assert_eq!(points.len(), 2);
        // Last sample of the day wins
        assert_eq!(points[0].date, d("2024-01-01"));
        assert_eq!(points[0].price, 0.105);
        assert_eq!(points[1].date, d("2024-01-02"));
        assert_eq!(points[1].price, 0.110);
    }

    #[tokio::test]
    async fn test_history_fetch_sends_unix_range_and_currency() {
        let mock_server = MockServer::start().await;
        let range = DateRange::new(d("2024-01-01"), d("2024-01-02")).unwrap();
        let from = d("2024-01-01").and_time(NaiveTime::MIN).and_utc().timestamp();
        let to = d("2024-01-03").and_time(NaiveTime::MIN).and_utc().timestamp();

        Mock::given(method("GET"))
            .and(path("/coins/kaspa/market_chart/range"))
            .and(query_param("vs_currency", "eur"))
            .and(query_param("from", from.to_string()))
            .and(query_param("to", to.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"prices": []}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "kaspa", None);
        let points = provider.fetch_range(range, Currency::Eur).await.unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_history_fetch_rate_limited() {
        let mock_server = MockServer::start().await;
        mount_chart(&mock_server, "kaspa", ResponseTemplate::new(429)).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "kaspa", None);
        let range = DateRange::single(d("2024-01-01"));
        let result = provider.fetch_range(range, Currency::Usd).await;

        assert!(matches!(result, Err(FetchError::RateLimited)));
    }

    #[tokio::test]
    async fn test_history_fetch_server_error() {
        let mock_server = MockServer::start().await;
        mount_chart(&mock_server, "kaspa", ResponseTemplate::new(500)).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "kaspa", None);
        let range = DateRange::single(d("2024-01-01"));
        let result = provider.fetch_range(range, Currency::Usd).await;

        assert!(matches!(result, Err(FetchError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_history_fetch_malformed_response() {
        let mock_server = MockServer::start().await;
        mount_chart(
            &mock_server,
            "kaspa",
            // "price" instead of "prices"
            ResponseTemplate::new(200).set_body_string(r#"{"price": []}"#),
        )
        .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "kaspa", None);
        let range = DateRange::single(d("2024-01-01"));
        let result = provider.fetch_range(range, Currency::Usd).await;

        match result {
            Err(FetchError::Unavailable(msg)) => {
                assert!(msg.contains("Failed to parse response"))
            }
            other => panic!("Expected parse failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_key_header_is_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/kaspa/market_chart/range"))
            .and(header(DEMO_KEY_HEADER, "CG-demo-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"prices": []}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            CoinGeckoProvider::new(&mock_server.uri(), "kaspa", Some("CG-demo-key".to_string()));
        let range = DateRange::single(d("2024-01-01"));
        provider.fetch_range(range, Currency::Usd).await.unwrap();
    }

    #[tokio::test]
    async fn test_spot_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "kaspa"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"kaspa": {"usd": 0.1234}}"#),
            )
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "kaspa", None);
        let point = provider.fetch_spot(Currency::Usd).await.unwrap();
        assert_eq!(point.price, 0.1234);
        assert_eq!(point.currency, Currency::Usd);
    }

    #[tokio::test]
    async fn test_spot_fetch_missing_coin() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri(), "kaspa", None);
        let result = provider.fetch_spot(Currency::Usd).await;

        assert!(matches!(result, Err(FetchError::Unavailable(_))));
    }
}
