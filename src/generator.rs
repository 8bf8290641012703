use std::collections::{HashMap, HashSet};
use std::fs;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::Deserialize;

use crate::addresses::{checksum_address, MainnetAliases};
use crate::chains::{Chain, CHAINS};
use crate::coingecko::Coingecko;
use crate::config::Config;
use crate::ipfs::{ipfs_pin, FleekConfig};
use crate::overrides::{
    load_metadata_overwrite, load_override_store, LocalIcons, TokenOverride, LOCAL_ASSETS_DIR,
};
use crate::rpc::Rpc;
use crate::tokenlist::{
    day_timestamp, first_version, merge_token_lists, min_version_bump, next_version,
    read_token_list, sort_tokens, write_token_list, TokenList, TokenRecord, VersionBump,
};
use crate::tokens::{collect_tokens, warn_degraded_metadata};
use crate::validation::invalid_tokens;

pub const TOKENLIST_NAME: &str = "EVM Tokenlists";

pub const TOKENLIST_LOGO_URI: &str =
    "https://raw.githubusercontent.com/evm-tokenlists/assets/master/assets/logo.png";

pub const TOKENLIST_KEYWORD: &str = "tokenlists";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListClass {
    Listed,
    Vetted,
    Untrusted,
}

impl ListClass {
    pub const ALL: [ListClass; 3] = [ListClass::Listed, ListClass::Vetted, ListClass::Untrusted];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListClass::Listed => "listed",
            ListClass::Vetted => "vetted",
            ListClass::Untrusted => "untrusted",
        }
    }

    /// Untrusted lists deliberately tolerate incomplete metadata; the
    /// other classes gate publication on every record validating.
    pub fn is_trusted(&self) -> bool {
        !matches!(self, ListClass::Untrusted)
    }
}

pub async fn build_network_lists(chain: &Chain, config: &Config) -> Result<()> {
    info!("Building {} tokenlists", chain.name);

    let manual = load_metadata_overwrite(chain.name)?;
    let rpc = Rpc::new(chain).await?;
    let icons = LocalIcons::load(LOCAL_ASSETS_DIR);
    let aliases = MainnetAliases::mainnet_defaults();

    let mut seen: HashMap<String, ListClass> = HashMap::new();

    for list_class in ListClass::ALL {
        let addresses = read_address_list(chain, list_class)?;

        for address in &addresses {
            match seen.get(address) {
                Some(previous_class) => warn!(
                    "Address {} appears in both the {} and {} lists",
                    address,
                    previous_class.as_str(),
                    list_class.as_str()
                ),
                None => {
                    seen.insert(address.clone(), list_class);
                }
            }
        }

        build_list(
            list_class, chain, config, &rpc, &icons, &aliases, &manual, addresses,
        )
        .await?;
    }

    Ok(())
}

async fn build_list(
    list_class: ListClass,
    chain: &Chain,
    config: &Config,
    rpc: &Rpc,
    icons: &LocalIcons,
    aliases: &MainnetAliases,
    manual: &HashMap<String, TokenOverride>,
    addresses: Vec<String>,
) -> Result<()> {
    info!("Building {} {} tokenlist", chain.name, list_class.as_str());

    let onchain = rpc.get_tokens_metadata(&addresses).await?;
    warn_degraded_metadata(chain, &onchain);

    let previous = read_previous_list(chain, list_class);

    let store = load_override_store(
        chain,
        icons,
        previous.as_ref().map(|list| list.tokens.as_slice()),
        manual.clone(),
        aliases.clone(),
    )
    .await;

    let mut coingecko = Coingecko::new(chain);

    let tokens = collect_tokens(&addresses, chain, &onchain, &store, &mut coingecko, icons).await?;

    generate(list_class, chain, tokens, previous, &config.fleek).await
}

async fn generate(
    list_class: ListClass,
    chain: &Chain,
    mut tokens: Vec<TokenRecord>,
    previous: Option<TokenList>,
    fleek: &FleekConfig,
) -> Result<()> {
    sort_tokens(&mut tokens);

    let version = match &previous {
        Some(previous_list) => {
            let bump = min_version_bump(&previous_list.tokens, &tokens);

            if bump == VersionBump::None {
                info!(
                    "The {} {} tokenlist is unchanged",
                    chain.name,
                    list_class.as_str()
                );
                return Ok(());
            }

            next_version(&previous_list.version, bump)
        }
        None => first_version(),
    };

    let list = TokenList {
        name: String::from(TOKENLIST_NAME),
        timestamp: day_timestamp(),
        logo_uri: String::from(TOKENLIST_LOGO_URI),
        keywords: vec![
            String::from(TOKENLIST_KEYWORD),
            String::from(list_class.as_str()),
        ],
        version,
        tokens,
    };

    let path = generated_list_path(chain.name, list_class);
    write_token_list(&path, &list)?;

    if list_class.is_trusted() {
        let invalid = invalid_tokens(&list);

        if !invalid.is_empty() {
            return Err(anyhow!(
                "Invalid tokens in the {} {} tokenlist: {}",
                chain.name,
                list_class.as_str(),
                invalid.join(", ")
            ));
        }
    }

    publish(list_class, chain, &list, fleek).await;

    Ok(())
}

async fn publish(list_class: ListClass, chain: &Chain, list: &TokenList, fleek: &FleekConfig) {
    let key = format!(
        "assets/{}.{}.tokenlist.json",
        chain.name,
        list_class.as_str()
    );

    if !fleek.has_credentials() {
        warn!("Fleek credentials are missing, skipping the upload of {}", key);
        return;
    }

    match ipfs_pin(&key, list, fleek).await {
        Ok(hash) => info!("Tokenlist {} uploaded with hash {}", key, hash),
        Err(err) => warn!("Unable to upload tokenlist {}: {}", key, err),
    }
}

/// Folds every network's generated list of one class into the combined
/// network agnostic document. Networks without a generated list are
/// skipped; at least one input is required.
pub fn merge_generated_lists(list_class: ListClass) -> Result<()> {
    let mut combined: Option<TokenList> = None;

    for chain in CHAINS.iter() {
        let path = generated_list_path(chain.name, list_class);

        let list = match read_token_list(&path) {
            Ok(list) => list,
            Err(_) => {
                warn!(
                    "No generated {} tokenlist for {}, skipping",
                    list_class.as_str(),
                    chain.name
                );
                continue;
            }
        };

        combined = Some(match combined {
            Some(current) => merge_token_lists(&current, &list),
            None => list,
        });
    }

    let combined = combined
        .ok_or_else(|| anyhow!("No generated {} tokenlists to merge", list_class.as_str()))?;

    let path = format!("generated/{}.tokenlist.json", list_class.as_str());
    write_token_list(&path, &combined)?;

    info!("Merged {} tokenlist written to {}", list_class.as_str(), path);

    Ok(())
}

pub fn generated_list_path(network: &str, list_class: ListClass) -> String {
    format!("generated/{}.{}.tokenlist.json", network, list_class.as_str())
}

#[derive(Debug, Deserialize)]
struct AddressList {
    tokens: Vec<String>,
}

fn read_address_list(chain: &Chain, list_class: ListClass) -> Result<Vec<String>> {
    let path = format!("lists/{}.{}.json", chain.name, list_class.as_str());

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Unable to read token list file {}", path))?;

    parse_address_list(&contents, &path)
}

/// Addresses are normalized to checksummed form and deduplicated; a
/// malformed address is a fatal input error.
fn parse_address_list(contents: &str, path: &str) -> Result<Vec<String>> {
    let list: AddressList = serde_json::from_str(contents)
        .with_context(|| format!("Unable to parse token list file {}", path))?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut addresses = Vec::new();

    for raw in list.tokens {
        let address = checksum_address(&raw)
            .with_context(|| format!("Invalid address in token list file {}", path))?;

        if seen.insert(address.clone()) {
            addresses.push(address);
        } else {
            warn!("Duplicate address {} in {}", address, path);
        }
    }

    Ok(addresses)
}

fn read_previous_list(chain: &Chain, list_class: ListClass) -> Option<TokenList> {
    // Most likely a new tokenlist which we haven't generated before.
    read_token_list(&generated_list_path(chain.name, list_class)).ok()
}
