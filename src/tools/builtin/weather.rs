//! Weather lookup tool backed by Open-Meteo

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::core::{ToolCall, ToolDefinition};
use crate::tools::Tool;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// How long a reading for one coordinate is reused
const CACHE_TTL: Duration = Duration::from_secs(3600);

/// Variables requested from the `current` block, in response order
const CURRENT_VARIABLES: [&str; 8] = [
    "temperature_2m",
    "apparent_temperature",
    "precipitation",
    "rain",
    "showers",
    "snowfall",
    "weather_code",
    "cloud_cover",
];

/// Retry schedule for transient weather service failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// A failed request and whether trying again may help
struct Failure {
    retryable: bool,
    error: anyhow::Error,
}

impl Failure {
    fn permanent(error: anyhow::Error) -> Self {
        Self {
            retryable: false,
            error,
        }
    }
}

/// Current conditions for a coordinate
pub struct GetWeather {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    cache: Mutex<HashMap<String, (Instant, Value)>>,
}

impl GetWeather {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, OPEN_METEO_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            retry: RetryPolicy::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn cached(&self, key: &str) -> Option<Value> {
        lock(&self.cache)
            .get(key)
            .filter(|(at, _)| at.elapsed() < CACHE_TTL)
            .map(|(_, value)| value.clone())
    }

    /// Fetch the forecast, retrying transport errors and 5xx/429 responses
    async fn fetch(&self, latitude: f64, longitude: f64) -> anyhow::Result<Value> {
        let mut attempt = 0;
        loop {
            match self.request(latitude, longitude).await {
                Ok(value) => return Ok(value),
                Err(failure) if failure.retryable && attempt < self.retry.max_retries => {
                    let backoff = self.retry.backoff(attempt);
                    debug!(attempt, ?backoff, error = %failure.error, "retrying weather request");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn request(&self, latitude: f64, longitude: f64) -> Result<Value, Failure> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_VARIABLES.join(",")),
                ("hourly", "temperature_2m".to_string()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await
            .map_err(|e| Failure {
                retryable: e.is_connect() || e.is_timeout(),
                error: anyhow::Error::new(e).context("weather service unreachable"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Failure {
                retryable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
                error: anyhow!("weather service rejected the request: {status}"),
            });
        }

        response.json().await.map_err(|e| {
            Failure::permanent(anyhow::Error::new(e).context("weather response was not JSON"))
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Tool for GetWeather {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_weather",
            "Get the current weather for a given location",
            json!({
                "type": "object",
                "properties": {
                    "latitude": {
                        "type": "number",
                        "description": "The latitude of the location"
                    },
                    "longitude": {
                        "type": "number",
                        "description": "The longitude of the location"
                    }
                },
                "required": ["latitude", "longitude"]
            }),
        )
    }

    async fn call(&self, call: &ToolCall) -> anyhow::Result<Value> {
        let latitude = call
            .get_f64("latitude")
            .ok_or_else(|| anyhow!("latitude must be a number"))?;
        let longitude = call
            .get_f64("longitude")
            .ok_or_else(|| anyhow!("longitude must be a number"))?;

        let key = format!("{latitude},{longitude}");
        let response = match self.cached(&key) {
            Some(response) => response,
            None => {
                let response = self.fetch(latitude, longitude).await?;
                lock(&self.cache).insert(key, (Instant::now(), response.clone()));
                response
            }
        };

        let current = response
            .get("current")
            .and_then(Value::as_object)
            .ok_or_else(|| anyhow!("weather response has no current conditions"))?;

        let reading: Map<String, Value> = CURRENT_VARIABLES
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    current.get(*name).cloned().unwrap_or(Value::Null),
                )
            })
            .collect();

        Ok(Value::Object(reading))
    }
}
