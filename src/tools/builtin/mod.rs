//! Built-in tools module
//!
//! The fixed set of tools the assistant ships with. Registration is explicit.

mod clock;
mod emoji;
mod network;
mod search;
mod stocks;
mod system;
mod weather;

pub use clock::CurrentTime;
pub use emoji::Emojistr;
pub use network::{GetApproxLocation, GetPublicIp};
pub use search::{SearchTool, NO_RESULTS, SEARCH_FAILED};
pub use stocks::GetStockInfo;
pub use system::GetHostname;
pub use weather::{GetWeather, RetryPolicy};

use reqwest::Client;
use std::time::Duration;
use tracing::info;

use crate::core::{Config, Result};
use crate::tools::ToolRegistry;

/// Build the registry with every built-in tool the configuration enables
pub fn registry_from_config(config: &Config) -> Result<ToolRegistry> {
    let timeout = Duration::from_secs(config.agent.tool_timeout_secs);
    let client = Client::builder().timeout(timeout).build()?;

    let mut registry = ToolRegistry::new().with_timeout(timeout);
    registry
        .register(CurrentTime)?
        .register(GetHostname)?
        .register(Emojistr)?
        .register(GetWeather::new(client.clone()))?
        .register(GetPublicIp::new(client.clone()))?
        .register(GetApproxLocation::new(client.clone()))?
        .register(GetStockInfo::new(client.clone()))?;

    match config.search {
        Some(ref search) => {
            registry.register(SearchTool::new(client, search.clone())?)?;
        }
        None => info!("search tool disabled: ELASTICSEARCH_HOST is not set"),
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let mut config = Config::default();
        config.search = None;

        let registry = registry_from_config(&config).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "current_time",
                "get_hostname",
                "emojistr",
                "get_weather",
                "get_public_ip",
                "get_aprox_location",
                "get_stock_info",
            ]
        );
    }
}
