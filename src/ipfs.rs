use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;

use crate::tokenlist::TokenList;

pub const FLEEK_STORAGE_URL: &str = "https://storageapi.fleek.co";

pub const DEFAULT_BUCKET: &str = "tokenlists-bucket";

#[derive(Debug, Clone)]
pub struct FleekConfig {
    pub api_key: String,
    pub api_secret: String,
    pub bucket: String,
}

impl FleekConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("FLEEK_API_KEY").unwrap_or_default(),
            api_secret: std::env::var("FLEEK_API_SECRET").unwrap_or_default(),
            bucket: std::env::var("FLEEK_BUCKET")
                .unwrap_or_else(|_| String::from(DEFAULT_BUCKET)),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "hashV0")]
    hash_v0: String,
}

/// Uploads the serialized list to the pinning service under the given
/// key and returns the resulting IPFS hash.
pub async fn ipfs_pin(key: &str, list: &TokenList, config: &FleekConfig) -> Result<String> {
    if !config.has_credentials() {
        return Err(anyhow!("No Fleek credentials provided"));
    }

    let body = serde_json::to_string(list).context("Unable to serialize tokenlist")?;

    let client = Client::new();

    let response = client
        .put(format!(
            "{}/{}/{}",
            FLEEK_STORAGE_URL, config.bucket, key
        ))
        .header("X-Api-Key", &config.api_key)
        .header("X-Api-Secret", &config.api_secret)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .context("Upload request failed")?;

    if !response.status().is_success() {
        return Err(anyhow!("Upload failed with status {}", response.status()));
    }

    let body = response
        .text()
        .await
        .context("Unable to read upload response")?;

    let pin: PinResponse =
        serde_json::from_str(&body).context("Malformed upload response")?;

    Ok(pin.hash_v0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_are_detected() {
        let config = FleekConfig {
            api_key: String::new(),
            api_secret: String::new(),
            bucket: String::from(DEFAULT_BUCKET),
        };

        assert!(!config.has_credentials());

        let config = FleekConfig {
            api_key: String::from("key"),
            api_secret: String::from("secret"),
            bucket: String::from(DEFAULT_BUCKET),
        };

        assert!(config.has_credentials());
    }

    #[tokio::test]
    async fn test_pin_without_credentials_is_an_error() {
        let config = FleekConfig {
            api_key: String::new(),
            api_secret: String::new(),
            bucket: String::from(DEFAULT_BUCKET),
        };

        let list = TokenList {
            name: String::from("EVM Tokenlists"),
            timestamp: String::from("2023-01-01T00:00:00.000Z"),
            logo_uri: String::from("https://example.com/logo.png"),
            keywords: vec![String::from("tokenlists")],
            version: crate::tokenlist::first_version(),
            tokens: Vec::new(),
        };

        assert!(ipfs_pin("assets/homestead.listed.tokenlist.json", &list, &config)
            .await
            .is_err());
    }
}
