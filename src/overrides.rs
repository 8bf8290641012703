use std::collections::{HashMap, HashSet};
use std::fs;

use anyhow::{Context, Result};
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::addresses::{checksum_address, MainnetAliases};
use crate::chains::Chain;
use crate::tokenlist::TokenRecord;

pub const LOCAL_ASSETS_DIR: &str = "assets";

pub const LOCAL_ICON_URL: &str =
    "https://raw.githubusercontent.com/evm-tokenlists/assets/master/assets";

pub const TRUSTWALLET_ASSETS_URL: &str =
    "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains";

/// Partial token metadata supplied by an override source. Any subset of
/// fields may be present.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenOverride {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<i64>,
    #[serde(rename = "logoURI")]
    pub logo_uri: Option<String>,
}

impl TokenOverride {
    /// Field-level shallow merge: fields present in `other` overwrite the
    /// matching fields here.
    pub fn merge_from(&mut self, other: &TokenOverride) {
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.symbol.is_some() {
            self.symbol = other.symbol.clone();
        }
        if other.decimals.is_some() {
            self.decimals = other.decimals;
        }
        if other.logo_uri.is_some() {
            self.logo_uri = other.logo_uri.clone();
        }
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.symbol.is_some()
            && self.decimals.is_some()
            && self.logo_uri.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TrustwalletList {
    tokens: Vec<TrustwalletToken>,
}

#[derive(Debug, Clone, Deserialize)]
struct TrustwalletToken {
    address: Option<String>,
    name: Option<String>,
    symbol: Option<String>,
    decimals: Option<i64>,
    #[serde(rename = "logoURI")]
    logo_uri: Option<String>,
}

/// Icon files maintained in the local assets directory, one
/// `<address>.png` per known token.
#[derive(Debug, Clone, Default)]
pub struct LocalIcons {
    addresses: HashSet<String>,
}

impl LocalIcons {
    pub fn load(dir: &str) -> Self {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                warn!("Local assets directory {} is missing, skipping icons", dir);
                return Self::default();
            }
        };

        let mut addresses = HashSet::new();

        for entry in entries.flatten() {
            let file_name = entry.file_name();

            let address = match file_name.to_str().and_then(|name| name.strip_suffix(".png")) {
                Some(address) => address,
                None => continue,
            };

            match checksum_address(address) {
                Ok(address) => {
                    addresses.insert(address);
                }
                Err(_) => warn!("Ignoring asset file with invalid address name: {:?}", file_name),
            }
        }

        Self { addresses }
    }

    pub fn logo_uri(&self, address: &str) -> Option<String> {
        if self.addresses.contains(address) {
            Some(format!("{}/{}.png", LOCAL_ICON_URL, address.to_lowercase()))
        } else {
            None
        }
    }

    fn addresses(&self) -> impl Iterator<Item = &String> {
        self.addresses.iter()
    }
}

/// Override metadata for one network build: ambient layers (community
/// asset list, local icons, previously published tokens) under the manual
/// overwrite file. Keys are checksummed; lookups that miss retry through
/// the mainnet alias table.
#[derive(Debug, Clone)]
pub struct OverrideStore {
    ambient: HashMap<String, TokenOverride>,
    manual: HashMap<String, TokenOverride>,
    aliases: MainnetAliases,
}

impl OverrideStore {
    pub fn new(aliases: MainnetAliases) -> Self {
        Self {
            ambient: HashMap::new(),
            manual: HashMap::new(),
            aliases,
        }
    }

    pub fn aliases(&self) -> &MainnetAliases {
        &self.aliases
    }

    pub fn layer_ambient(&mut self, address: String, entry: TokenOverride) {
        self.ambient.entry(address).or_default().merge_from(&entry);
    }

    pub fn layer_manual(&mut self, address: String, entry: TokenOverride) {
        self.manual.entry(address).or_default().merge_from(&entry);
    }

    /// The effective override for an address. Manual fields rank above the
    /// ambient layers for name/symbol/logo; decimals come from the manual
    /// layer alone, since on-chain data stays authoritative for decimals.
    pub fn overwrite_for(&self, address: &str) -> TokenOverride {
        let ambient = self.lookup(&self.ambient, address);
        let manual = self.lookup(&self.manual, address);

        let mut combined = TokenOverride::default();

        if let Some(ambient) = ambient {
            combined.merge_from(ambient);
        }
        combined.decimals = None;

        if let Some(manual) = manual {
            combined.merge_from(manual);
        }

        combined
    }

    fn lookup<'a>(
        &self,
        layer: &'a HashMap<String, TokenOverride>,
        address: &str,
    ) -> Option<&'a TokenOverride> {
        if let Some(entry) = layer.get(address) {
            return Some(entry);
        }

        let mainnet = self.aliases.resolve(address);

        if mainnet != address {
            layer.get(&mainnet)
        } else {
            None
        }
    }
}

/// Builds the override store for a network: the Trust Wallet community
/// list, then the local icon directory, then the previously published
/// tokens, each layer field-wise overwriting the one before it, with the
/// manual overwrite file on top.
pub async fn load_override_store(
    chain: &Chain,
    icons: &LocalIcons,
    previous_tokens: Option<&[TokenRecord]>,
    manual: HashMap<String, TokenOverride>,
    aliases: MainnetAliases,
) -> OverrideStore {
    let mut store = OverrideStore::new(aliases);

    for (address, entry) in fetch_trustwallet_overrides(chain).await {
        store.layer_ambient(address, entry);
    }

    for address in icons.addresses() {
        let entry = TokenOverride {
            logo_uri: icons.logo_uri(address),
            ..TokenOverride::default()
        };

        store.layer_ambient(address.clone(), entry);
    }

    if let Some(tokens) = previous_tokens {
        for token in tokens {
            let entry = TokenOverride {
                name: Some(token.name.clone()),
                symbol: Some(token.symbol.clone()),
                decimals: Some(token.decimals),
                logo_uri: token.logo_uri.clone(),
            };

            store.layer_ambient(token.address.clone(), entry);
        }
    }

    for (address, entry) in manual {
        store.layer_manual(address, entry);
    }

    store
}

/// The community asset list is enrichment data: any fetch or decode
/// failure degrades to an empty layer instead of failing the build.
async fn fetch_trustwallet_overrides(chain: &Chain) -> Vec<(String, TokenOverride)> {
    let url = format!(
        "{}/{}/tokenlist.json",
        TRUSTWALLET_ASSETS_URL, chain.trustwallet_blockchain
    );

    let client = Client::new();

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(_) => {
            warn!("Unable to fetch the community asset list for {}", chain.name);
            return Vec::new();
        }
    };

    let body = match response.text().await {
        Ok(body) => body,
        Err(_) => {
            warn!("Unable to fetch the community asset list for {}", chain.name);
            return Vec::new();
        }
    };

    let list = match serde_json::from_str::<TrustwalletList>(&body) {
        Ok(list) => list,
        Err(_) => {
            warn!("Malformed community asset list for {}", chain.name);
            return Vec::new();
        }
    };

    let mut overrides = Vec::new();

    for token in list.tokens {
        let address = match token.address.as_deref().map(checksum_address) {
            Some(Ok(address)) => address,
            _ => continue,
        };

        overrides.push((
            address,
            TokenOverride {
                name: token.name,
                symbol: token.symbol,
                decimals: token.decimals,
                logo_uri: token.logo_uri,
            },
        ));
    }

    overrides
}

/// The manual overwrite file is a required input for every network build.
pub fn load_metadata_overwrite(network: &str) -> Result<HashMap<String, TokenOverride>> {
    let path = format!("data/{}.metadataOverwrite.json", network);

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Unable to read metadata overwrite file {}", path))?;

    let raw: HashMap<String, TokenOverride> = serde_json::from_str(&contents)
        .with_context(|| format!("Unable to parse metadata overwrite file {}", path))?;

    let mut overwrites = HashMap::new();

    for (address, entry) in raw {
        overwrites.insert(checksum_address(&address)?, entry);
    }

    Ok(overwrites)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAL: &str = "0xba100000625a3754423978a60c9317c58a424e3D";
    const BAL_GOERLI: &str = "0xfA8449189744799aD2AcE7e0EBAC8BB7575eff47";

    fn named(name: &str) -> TokenOverride {
        TokenOverride {
            name: Some(String::from(name)),
            ..TokenOverride::default()
        }
    }

    #[test]
    fn test_later_layers_overwrite_fields() {
        let mut store = OverrideStore::new(MainnetAliases::mainnet_defaults());

        store.layer_ambient(
            String::from(BAL),
            TokenOverride {
                name: Some(String::from("Balancer")),
                symbol: Some(String::from("BAL")),
                ..TokenOverride::default()
            },
        );
        store.layer_ambient(
            String::from(BAL),
            TokenOverride {
                logo_uri: Some(String::from("https://example.com/bal.png")),
                ..TokenOverride::default()
            },
        );

        let combined = store.overwrite_for(BAL);

        assert_eq!(combined.name.as_deref(), Some("Balancer"));
        assert_eq!(combined.symbol.as_deref(), Some("BAL"));
        assert_eq!(
            combined.logo_uri.as_deref(),
            Some("https://example.com/bal.png")
        );
    }

    #[test]
    fn test_manual_layer_wins() {
        let mut store = OverrideStore::new(MainnetAliases::mainnet_defaults());

        store.layer_ambient(String::from(BAL), named("Community Balancer"));
        store.layer_manual(String::from(BAL), named("Balancer"));

        assert_eq!(
            store.overwrite_for(BAL).name.as_deref(),
            Some("Balancer")
        );
    }

    #[test]
    fn test_ambient_decimals_are_dropped() {
        let mut store = OverrideStore::new(MainnetAliases::mainnet_defaults());

        store.layer_ambient(
            String::from(BAL),
            TokenOverride {
                decimals: Some(8),
                ..TokenOverride::default()
            },
        );

        assert_eq!(store.overwrite_for(BAL).decimals, None);

        store.layer_manual(
            String::from(BAL),
            TokenOverride {
                decimals: Some(18),
                ..TokenOverride::default()
            },
        );

        assert_eq!(store.overwrite_for(BAL).decimals, Some(18));
    }

    #[test]
    fn test_missed_lookup_retries_through_aliases() {
        let mut store = OverrideStore::new(MainnetAliases::mainnet_defaults());

        store.layer_ambient(String::from(BAL), named("Balancer"));

        // The bridged testnet twin has no entry of its own.
        assert_eq!(
            store.overwrite_for(BAL_GOERLI).name.as_deref(),
            Some("Balancer")
        );
    }

    #[test]
    fn test_is_complete() {
        let mut entry = TokenOverride {
            name: Some(String::from("Balancer")),
            symbol: Some(String::from("BAL")),
            decimals: Some(18),
            logo_uri: None,
        };

        assert!(!entry.is_complete());

        entry.logo_uri = Some(String::from("https://example.com/bal.png"));
        assert!(entry.is_complete());
    }

    #[test]
    fn test_local_icons_lookup() {
        let dir = std::env::temp_dir().join("evm-tokenlists-icons-test");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.png", BAL)), "").unwrap();
        fs::write(dir.join("index.json"), "{}").unwrap();

        let icons = LocalIcons::load(dir.to_str().unwrap());

        assert_eq!(
            icons.logo_uri(BAL),
            Some(format!("{}/{}.png", LOCAL_ICON_URL, BAL.to_lowercase()))
        );
        assert_eq!(icons.logo_uri("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), None);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_local_icons_missing_directory_degrades() {
        let icons = LocalIcons::load("definitely-not-a-directory");

        assert_eq!(icons.logo_uri(BAL), None);
    }
}
