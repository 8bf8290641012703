use std::collections::HashMap;

use anyhow::{anyhow, Result};
use log::warn;

use crate::chains::Chain;
use crate::coingecko::{Coingecko, ExternalMetadata};
use crate::overrides::{LocalIcons, OverrideStore, TokenOverride};
use crate::rpc::{OnchainMetadata, UNKNOWN_SENTINEL};
use crate::tokenlist::TokenRecord;

/// Resolves one token's fields from the three sources. Precedence is
/// field-independent: overrides rank first everywhere, the external
/// service is trusted for names and logos before the chain, and the chain
/// is trusted for symbols before the external service. Decimals are
/// consensus-critical, so the override value only ever comes from the
/// manual layer and everything else defers to the chain.
pub fn merge_token_metadata(
    address: &str,
    chain_id: i64,
    onchain: &OnchainMetadata,
    external: &ExternalMetadata,
    overwrite: &TokenOverride,
    icon: Option<String>,
) -> TokenRecord {
    let name = overwrite
        .name
        .clone()
        .or_else(|| external.name.clone())
        .unwrap_or_else(|| onchain.name.clone());

    let symbol = overwrite
        .symbol
        .clone()
        .unwrap_or_else(|| onchain.symbol.clone());

    let symbol = if symbol == UNKNOWN_SENTINEL {
        external.symbol.clone().unwrap_or(symbol)
    } else {
        symbol
    };

    let decimals = overwrite.decimals.unwrap_or(onchain.decimals);

    let logo_uri = overwrite
        .logo_uri
        .clone()
        .or(icon)
        .or_else(|| external.logo_uri.clone());

    TokenRecord {
        address: String::from(address),
        chain_id,
        name,
        symbol,
        decimals,
        logo_uri,
    }
}

fn record_from_overwrite(address: &str, chain_id: i64, overwrite: &TokenOverride) -> TokenRecord {
    TokenRecord {
        address: String::from(address),
        chain_id,
        name: overwrite.name.clone().unwrap_or_default(),
        symbol: overwrite.symbol.clone().unwrap_or_default(),
        decimals: overwrite.decimals.unwrap_or_default(),
        logo_uri: overwrite.logo_uri.clone(),
    }
}

/// Produces one record per input address by combining on-chain metadata,
/// the override store and the external resolver. Addresses with a complete
/// override skip the external lookup entirely; the output is the same
/// either way since present override fields win every field resolution.
pub async fn collect_tokens(
    addresses: &[String],
    chain: &Chain,
    onchain: &HashMap<String, OnchainMetadata>,
    store: &OverrideStore,
    coingecko: &mut Coingecko,
    icons: &LocalIcons,
) -> Result<Vec<TokenRecord>> {
    let mut tokens = Vec::with_capacity(addresses.len());

    for address in addresses {
        let overwrite = store.overwrite_for(address);

        if overwrite.is_complete() {
            tokens.push(record_from_overwrite(address, chain.id, &overwrite));
            continue;
        }

        let onchain_metadata = onchain
            .get(address)
            .ok_or_else(|| anyhow!("Missing onchain metadata for {}", address))?;

        let (mainnet_address, external) = coingecko.get_token_metadata(address).await;

        let icon_address =
            mainnet_address.unwrap_or_else(|| store.aliases().resolve(address));
        let icon = icons.logo_uri(&icon_address);

        tokens.push(merge_token_metadata(
            address,
            chain.id,
            onchain_metadata,
            &external,
            &overwrite,
            icon,
        ));
    }

    Ok(tokens)
}

/// Enumerates the addresses whose on-chain decode degraded to sentinel
/// values, so operators can patch the overwrite file and re-run.
pub fn warn_degraded_metadata(chain: &Chain, onchain: &HashMap<String, OnchainMetadata>) {
    let mut degraded: Vec<&str> = onchain
        .iter()
        .filter(|(_, metadata)| metadata.is_degraded())
        .map(|(address, _)| address.as_str())
        .collect();

    if degraded.is_empty() {
        return;
    }

    degraded.sort_unstable();

    warn!(
        "Unable to decode metadata for {} tokens on {}: {}",
        degraded.len(),
        chain.name,
        degraded.join(", ")
    );
}
