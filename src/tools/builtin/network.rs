//! Public IP and approximate location tools backed by ipinfo.io

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::{ToolCall, ToolDefinition};
use crate::tools::Tool;

const IPINFO_URL: &str = "https://ipinfo.io/json";

#[derive(Debug, Deserialize)]
struct IpInfo {
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

async fn fetch_ip_info(client: &Client, url: &str) -> anyhow::Result<IpInfo> {
    client
        .get(url)
        .send()
        .await
        .context("ipinfo.io unreachable")?
        .error_for_status()
        .context("ipinfo.io rejected the request")?
        .json()
        .await
        .context("ipinfo.io response was not valid JSON")
}

/// Public IP address of this machine
pub struct GetPublicIp {
    client: Client,
    url: String,
}

impl GetPublicIp {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, IPINFO_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Tool for GetPublicIp {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_public_ip",
            "Get the public IP address of the machine.",
            json!({
                "type": "object",
                "properties": {}
            }),
        )
    }

    async fn call(&self, _call: &ToolCall) -> anyhow::Result<Value> {
        let info = fetch_ip_info(&self.client, &self.url).await?;
        let ip = info.ip.ok_or_else(|| anyhow!("ipinfo.io returned no address"))?;
        Ok(json!(ip))
    }
}

/// City, region, and country derived from the public IP
pub struct GetApproxLocation {
    client: Client,
    url: String,
}

impl GetApproxLocation {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, IPINFO_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Tool for GetApproxLocation {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_aprox_location",
            "Get the location information",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        )
    }

    async fn call(&self, _call: &ToolCall) -> anyhow::Result<Value> {
        let info = fetch_ip_info(&self.client, &self.url).await?;
        Ok(json!({
            "city": info.city,
            "country": info.country,
            "region": info.region,
        }))
    }
}
