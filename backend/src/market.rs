use crate::{config::MarketConfig, models::*};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
const OVERVIEW_SYMBOLS: [&str; 8] = ["SPY", "QQQ", "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA"];
const MAX_CONCURRENT_QUOTES: usize = 4;

/// Best-effort quotes. Nothing here returns an error; failures become zeroed values.
pub struct MarketDataService {
    client: Client,
    api_key: String,
}

impl MarketDataService {
    pub fn new(config: &MarketConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client for quotes: {}", e);
                Client::new()
            });

        Self {
            client,
            api_key: config
                .alpha_vantage_key
                .clone()
                .unwrap_or_else(|| "demo".to_string()),
        }
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, reqwest::Error> {
        self.client
            .get(ALPHA_VANTAGE_URL)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?
            .json::<Value>()
            .await
    }

    pub async fn get_stock_quote(&self, symbol: &str) -> StockQuote {
        let symbol = symbol.trim().to_uppercase();
        match self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol.as_str())])
            .await
        {
            Ok(data) => parse_global_quote(&symbol, &data),
            Err(e) => {
                tracing::warn!("Failed to fetch quote for {}: {}", symbol, e);
                StockQuote::empty(&symbol)
            }
        }
    }

    /// Quotes for the headline symbols, fetched concurrently, keeping only priced ones in order.
    pub async fn get_market_overview(&self) -> Vec<StockQuote> {
        stream::iter(OVERVIEW_SYMBOLS.map(String::from))
            .map(|symbol| async move { self.get_stock_quote(&symbol).await })
            .buffered(MAX_CONCURRENT_QUOTES)
            .filter(|quote| futures::future::ready(quote.price > 0.0))
            .collect()
            .await
    }

    pub fn get_crypto_prices(&self) -> Vec<CryptoPrice> {
        [
            ("BTC", "Bitcoin", 45000.0, 2.5),
            ("ETH", "Ethereum", 2800.0, 3.2),
            ("BNB", "Binance Coin", 350.0, -1.2),
        ]
        .into_iter()
        .map(|(symbol, name, price, change_percent)| CryptoPrice {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change_percent,
        })
        .collect()
    }

    pub async fn get_forex_rate(&self, from: &str, to: &str) -> ForexRate {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();
        match self
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", from.as_str()),
                ("to_currency", to.as_str()),
            ])
            .await
        {
            Ok(data) => parse_exchange_rate(&from, &to, &data),
            Err(e) => {
                tracing::warn!("Failed to fetch {}/{} rate: {}", from, to, e);
                ForexRate {
                    from,
                    to,
                    rate: 0.0,
                    timestamp: None,
                }
            }
        }
    }
}

fn field_f64(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .and_then(|v| v.trim().trim_end_matches('%').parse::<f64>().ok())
}

pub(crate) fn parse_global_quote(symbol: &str, data: &Value) -> StockQuote {
    match data.get("Global Quote").filter(|q| q.as_object().is_some_and(|m| !m.is_empty())) {
        Some(quote) => StockQuote {
            symbol: symbol.to_string(),
            price: field_f64(quote, "05. price").unwrap_or(0.0),
            change_percent: field_f64(quote, "10. change percent").unwrap_or(0.0),
            volume: field_f64(quote, "06. volume"),
        },
        None => StockQuote::empty(symbol),
    }
}

pub(crate) fn parse_exchange_rate(from: &str, to: &str, data: &Value) -> ForexRate {
    let rate_data = data.get("Realtime Currency Exchange Rate");
    ForexRate {
        from: from.to_string(),
        to: to.to_string(),
        rate: rate_data
            .and_then(|r| field_f64(r, "5. Exchange Rate"))
            .unwrap_or(0.0),
        timestamp: rate_data
            .and_then(|r| r.get("6. Last Refreshed"))
            .and_then(|t| t.as_str())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_global_quote() {
        let data = json!({
            "Global Quote": {
                "01. symbol": "AAPL",
                "05. price": "189.8400",
                "06. volume": "48123456",
                "10. change percent": "-1.2345%"
            }
        });
        let quote = parse_global_quote("AAPL", &data);
        assert_eq!(quote.price, 189.84);
        assert_eq!(quote.change_percent, -1.2345);
        assert_eq!(quote.volume, Some(48123456.0));
    }

    #[test]
    fn empty_or_rate_limited_quote_is_zeroed() {
        assert_eq!(parse_global_quote("SPY", &json!({"Global Quote": {}})), StockQuote::empty("SPY"));
        assert_eq!(
            parse_global_quote("SPY", &json!({"Note": "Thank you for using Alpha Vantage!"})),
            StockQuote::empty("SPY")
        );
    }

    #[test]
    fn missing_volume_stays_unset() {
        let data = json!({"Global Quote": {"05. price": "101.50", "10. change percent": "0.5%"}});
        let quote = parse_global_quote("QQQ", &data);
        assert_eq!(quote.price, 101.5);
        assert_eq!(quote.volume, None);
    }

    #[test]
    fn parses_exchange_rate() {
        let data = json!({
            "Realtime Currency Exchange Rate": {
                "5. Exchange Rate": "0.92150000",
                "6. Last Refreshed": "2026-10-19 08:00:01"
            }
        });
        let rate = parse_exchange_rate("USD", "EUR", &data);
        assert_eq!(rate.rate, 0.9215);
        assert_eq!(rate.timestamp.as_deref(), Some("2026-10-19 08:00:01"));
    }

    #[test]
    fn missing_exchange_rate_is_zero() {
        let rate = parse_exchange_rate("USD", "XYZ", &json!({"Error Message": "Invalid API call"}));
        assert_eq!(rate.rate, 0.0);
        assert!(rate.timestamp.is_none());
    }

    #[tokio::test]
    async fn overview_can_run_on_a_spawned_task() {
        let service = std::sync::Arc::new(MarketDataService::new(&MarketConfig {
            alpha_vantage_key: None,
            timeout_secs: 1,
        }));
        // Compiles only if the overview future is Send for any borrow of the service.
        let handle = tokio::spawn(async move { service.get_market_overview().await });
        handle.abort();
    }

    #[test]
    fn crypto_prices_are_fixed() {
        let service = MarketDataService::new(&MarketConfig {
            alpha_vantage_key: None,
            timeout_secs: 10,
        });
        let prices = service.get_crypto_prices();
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].symbol, "BTC");
    }
}
