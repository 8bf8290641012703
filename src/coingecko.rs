use std::collections::HashMap;
use std::time::Duration;

use log::warn;
use reqwest::Client;
use serde::Deserialize;
use tokio::time::sleep;

use crate::addresses::checksum_address;
use crate::chains::Chain;

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

pub const COINGECKO_RATE_LIMIT_BATCH: usize = 10;
pub const COINGECKO_RATE_LIMIT_PAUSE: Duration = Duration::from_millis(2000);

/// Partial token metadata sourced from the external price service. Any
/// field may be absent; a failed lookup yields all fields absent.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ExternalMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub logo_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoingeckoCoin {
    name: Option<String>,
    symbol: Option<String>,
    image: Option<CoingeckoImage>,
    platforms: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CoingeckoImage {
    large: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Coingecko {
    client: Client,
    chain: Chain,
    lookups: usize,
}

impl Coingecko {
    pub fn new(chain: &Chain) -> Self {
        Self {
            client: Client::new(),
            chain: Chain::new_from_borrowed(chain),
            lookups: 0,
        }
    }

    /// Looks a token up by contract address. Returns the token's canonical
    /// mainnet address when the external source knows one, plus whatever
    /// partial metadata came back. Unsupported networks and failed lookups
    /// yield an empty result, never an error.
    ///
    /// Lookups are serialized and paced: after every tenth request the
    /// resolver sleeps to stay under the external API's rate limit.
    pub async fn get_token_metadata(
        &mut self,
        address: &str,
    ) -> (Option<String>, ExternalMetadata) {
        if !self.chain.supports_coingecko() {
            return (None, ExternalMetadata::default());
        }

        self.lookups += 1;

        if self.lookups % COINGECKO_RATE_LIMIT_BATCH == 0 {
            sleep(COINGECKO_RATE_LIMIT_PAUSE).await;
        }

        let url = format!(
            "{}/coins/{}/contract/{}",
            COINGECKO_API_URL,
            self.chain.coingecko_platform,
            address.to_lowercase()
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(_) => {
                warn!("Coingecko lookup failed for token: {}", address);
                return (None, ExternalMetadata::default());
            }
        };

        if !response.status().is_success() {
            warn!("Coingecko ID not found for token: {}", address);
            return (None, ExternalMetadata::default());
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(_) => {
                warn!("Coingecko lookup failed for token: {}", address);
                return (None, ExternalMetadata::default());
            }
        };

        let coin = match serde_json::from_str::<CoingeckoCoin>(&body) {
            Ok(coin) => coin,
            Err(_) => {
                warn!("Malformed Coingecko response for token: {}", address);
                return (None, ExternalMetadata::default());
            }
        };

        (mainnet_address(&coin), external_metadata(coin))
    }
}

fn mainnet_address(coin: &CoingeckoCoin) -> Option<String> {
    let platforms = coin.platforms.as_ref()?;
    let address = platforms.get("ethereum")?;

    checksum_address(address).ok()
}

fn external_metadata(coin: CoingeckoCoin) -> ExternalMetadata {
    ExternalMetadata {
        name: coin.name,
        symbol: coin.symbol,
        logo_uri: coin.image.and_then(|image| image.large),
    }
}
