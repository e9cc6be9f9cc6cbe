//! Stock price history tool backed by the Yahoo Finance chart API

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{ToolCall, ToolDefinition};
use crate::tools::Tool;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Daily rows for the period; `Null` when there is no data
fn daily_rows(result: &ChartResult) -> Value {
    let empty = Quote::default();
    let quote = result.indicators.quote.first().unwrap_or(&empty);
    let at = |series: &Vec<Option<f64>>, i: usize| series.get(i).copied().flatten();

    let rows: Vec<Value> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = DateTime::from_timestamp(*ts, 0)?;
            Some(json!({
                "Date": date.format("%Y-%m-%d").to_string(),
                "Open": round2(at(&quote.open, i)?),
                "High": round2(at(&quote.high, i)?),
                "Low": round2(at(&quote.low, i)?),
                "Close": round2(at(&quote.close, i)?),
                "Volume": round2(at(&quote.volume, i).unwrap_or(0.0)),
            }))
        })
        .collect();

    if rows.is_empty() {
        Value::Null
    } else {
        Value::Array(rows)
    }
}

/// Price history for a ticker symbol
pub struct GetStockInfo {
    client: Client,
    base_url: String,
}

impl GetStockInfo {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, CHART_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Tool for GetStockInfo {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_stock_info",
            "Retrieves the current stock price info for a given stock ticker",
            json!({
                "type": "object",
                "properties": {
                    "symbol": {
                        "type": "string",
                        "description": "The ticker symbol of the stock"
                    },
                    "period": {
                        "type": "string",
                        "description": "The period for which to retrieve the stock data (e.g., '1d', '5d', '1mo', etc.)"
                    }
                },
                "required": ["symbol", "period"]
            }),
        )
    }

    async fn call(&self, call: &ToolCall) -> anyhow::Result<Value> {
        let symbol = call
            .get_string("symbol")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("symbol must be a non-empty string"))?;
        let period = call.get_string("period").unwrap_or_else(|| "1d".to_string());

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), symbol.trim());
        let response: ChartResponse = self
            .client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", "1d")])
            .header("User-Agent", concat!("toolchat/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .context("stock service unreachable")?
            .error_for_status()
            .context("stock service rejected the request")?
            .json()
            .await
            .context("stock response was not valid JSON")?;

        let value = response
            .chart
            .result
            .as_ref()
            .and_then(|r| r.first())
            .map(daily_rows)
            .unwrap_or(Value::Null);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_rows() {
        let result: ChartResult = serde_json::from_value(json!({
            "timestamp": [1704205800, 1704292200],
            "indicators": {"quote": [{
                "open": [187.149994, null],
                "high": [188.440002, 185.88],
                "low": [183.889999, 183.43],
                "close": [185.639999, 184.25],
                "volume": [82488700, 58414500]
            }]}
        }))
        .unwrap();

        let rows = daily_rows(&result);
        let rows = rows.as_array().unwrap();
        // The second day has no open price and is skipped
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Date"], "2024-01-02");
        assert_eq!(rows[0]["Open"], 187.15);
        assert_eq!(rows[0]["Close"], 185.64);
    }

    #[test]
    fn test_no_data_is_null() {
        let result: ChartResult =
            serde_json::from_value(json!({"timestamp": [], "indicators": {"quote": []}})).unwrap();
        assert_eq!(daily_rows(&result), Value::Null);
    }
}
