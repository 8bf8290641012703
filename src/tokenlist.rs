use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub address: String,
    #[serde(rename = "chainId")]
    pub chain_id: i64,
    pub name: String,
    pub symbol: String,
    pub decimals: i64,
    #[serde(rename = "logoURI", skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenList {
    pub name: String,
    pub timestamp: String,
    #[serde(rename = "logoURI")]
    pub logo_uri: String,
    pub keywords: Vec<String>,
    pub version: Version,
    pub tokens: Vec<TokenRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VersionBump {
    None,
    Patch,
    Minor,
    Major,
}

/// Minimal semantic bump between two revisions of the same list, keyed by
/// (address, chainId). Removals dominate additions and decimals changes,
/// which dominate cosmetic field changes.
pub fn min_version_bump(previous: &[TokenRecord], current: &[TokenRecord]) -> VersionBump {
    let previous_tokens: HashMap<(String, i64), &TokenRecord> = previous
        .iter()
        .map(|token| ((token.address.clone(), token.chain_id), token))
        .collect();

    let current_tokens: HashMap<(String, i64), &TokenRecord> = current
        .iter()
        .map(|token| ((token.address.clone(), token.chain_id), token))
        .collect();

    let removed = previous_tokens
        .keys()
        .any(|key| !current_tokens.contains_key(key));

    if removed {
        return VersionBump::Major;
    }

    let added = current_tokens
        .keys()
        .any(|key| !previous_tokens.contains_key(key));

    let decimals_changed = previous_tokens.iter().any(|(key, token)| {
        current_tokens
            .get(key)
            .map(|current| current.decimals != token.decimals)
            .unwrap_or(false)
    });

    if added || decimals_changed {
        return VersionBump::Minor;
    }

    let cosmetic_changed = previous_tokens.iter().any(|(key, token)| {
        current_tokens
            .get(key)
            .map(|current| {
                current.name != token.name
                    || current.symbol != token.symbol
                    || current.logo_uri != token.logo_uri
            })
            .unwrap_or(false)
    });

    if cosmetic_changed {
        return VersionBump::Patch;
    }

    VersionBump::None
}

pub fn next_version(version: &Version, bump: VersionBump) -> Version {
    match bump {
        VersionBump::Major => Version {
            major: version.major + 1,
            minor: 0,
            patch: 0,
        },
        VersionBump::Minor => Version {
            major: version.major,
            minor: version.minor + 1,
            patch: 0,
        },
        VersionBump::Patch => Version {
            major: version.major,
            minor: version.minor,
            patch: version.patch + 1,
        },
        VersionBump::None => *version,
    }
}

/// Every list class starts at 1.0.0 on its first publication.
pub fn first_version() -> Version {
    Version {
        major: 1,
        minor: 0,
        patch: 0,
    }
}

/// UTC timestamp truncated to the day, so reruns within one day compare
/// equal.
pub fn day_timestamp() -> String {
    format!("{}T00:00:00.000Z", Utc::now().format("%Y-%m-%d"))
}

pub fn sort_tokens(tokens: &mut [TokenRecord]) {
    tokens.sort_by(|a, b| a.name.cmp(&b.name));
}

/// Combines two same-class lists into one document carrying the merger's
/// identity. Tokens are deduplicated by (address, chainId), first
/// occurrence wins, and re-sorted by name.
pub fn merge_token_lists(merger: &TokenList, merged: &TokenList) -> TokenList {
    let mut seen: HashSet<(String, i64)> = HashSet::new();
    let mut tokens: Vec<TokenRecord> = Vec::new();

    for token in merger.tokens.iter().chain(merged.tokens.iter()) {
        if seen.insert((token.address.clone(), token.chain_id)) {
            tokens.push(token.clone());
        }
    }

    sort_tokens(&mut tokens);

    TokenList {
        name: merger.name.clone(),
        timestamp: merger.timestamp.clone(),
        logo_uri: merger.logo_uri.clone(),
        keywords: merger.keywords.clone(),
        version: merger.version,
        tokens,
    }
}

pub fn read_token_list(path: &str) -> Result<TokenList> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Unable to read tokenlist file {}", path))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Unable to parse tokenlist file {}", path))
}

pub fn write_token_list(path: &str, list: &TokenList) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Unable to create output directory for {}", path))?;
    }

    let contents = serde_json::to_string_pretty(list)
        .context("Unable to serialize tokenlist")?;

    fs::write(path, contents).with_context(|| format!("Unable to write tokenlist file {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(address: &str, chain_id: i64, name: &str) -> TokenRecord {
        TokenRecord {
            address: String::from(address),
            chain_id,
            name: String::from(name),
            symbol: name.to_uppercase(),
            decimals: 18,
            logo_uri: None,
        }
    }

    fn list(tokens: Vec<TokenRecord>) -> TokenList {
        TokenList {
            name: String::from("EVM Tokenlists"),
            timestamp: String::from("2023-01-01T00:00:00.000Z"),
            logo_uri: String::from("https://example.com/logo.png"),
            keywords: vec![String::from("tokenlists"), String::from("listed")],
            version: first_version(),
            tokens,
        }
    }

    #[test]
    fn test_identical_sets_need_no_bump() {
        let previous = vec![token("0xA", 1, "Aave"), token("0xB", 1, "Balancer")];
        let current = previous.clone();

        assert_eq!(min_version_bump(&previous, &current), VersionBump::None);

        // A second evaluation over the same inputs stays "unchanged".
        assert_eq!(min_version_bump(&previous, &current), VersionBump::None);
    }

    #[test]
    fn test_addition_is_a_minor_bump_with_patch_reset() {
        let previous = vec![token("0xA", 1, "Aave")];
        let current = vec![token("0xA", 1, "Aave"), token("0xB", 1, "Balancer")];

        let bump = min_version_bump(&previous, &current);
        assert_eq!(bump, VersionBump::Minor);

        let version = Version {
            major: 1,
            minor: 2,
            patch: 7,
        };
        assert_eq!(
            next_version(&version, bump),
            Version {
                major: 1,
                minor: 3,
                patch: 0
            }
        );
    }

    #[test]
    fn test_removal_is_a_major_bump_with_reset() {
        let previous = vec![token("0xA", 1, "Aave"), token("0xB", 1, "Balancer")];
        let current = vec![token("0xA", 1, "Aave")];

        let bump = min_version_bump(&previous, &current);
        assert_eq!(bump, VersionBump::Major);

        let version = Version {
            major: 1,
            minor: 4,
            patch: 2,
        };
        assert_eq!(
            next_version(&version, bump),
            Version {
                major: 2,
                minor: 0,
                patch: 0
            }
        );
    }

    #[test]
    fn test_decimals_change_is_a_minor_bump() {
        let previous = vec![token("0xA", 1, "Aave")];
        let mut current = previous.clone();
        current[0].decimals = 6;

        assert_eq!(min_version_bump(&previous, &current), VersionBump::Minor);
    }

    #[test]
    fn test_cosmetic_change_is_a_patch_bump() {
        let previous = vec![token("0xA", 1, "Aave")];

        let mut renamed = previous.clone();
        renamed[0].name = String::from("Aave Token");
        assert_eq!(min_version_bump(&previous, &renamed), VersionBump::Patch);

        let mut relogoed = previous.clone();
        relogoed[0].logo_uri = Some(String::from("https://example.com/aave.png"));
        assert_eq!(min_version_bump(&previous, &relogoed), VersionBump::Patch);
    }

    #[test]
    fn test_chain_id_change_is_a_major_bump() {
        let previous = vec![token("0xA", 1, "Aave")];
        let current = vec![token("0xA", 137, "Aave")];

        assert_eq!(min_version_bump(&previous, &current), VersionBump::Major);
    }

    #[test]
    fn test_first_publish_version() {
        assert_eq!(
            first_version(),
            Version {
                major: 1,
                minor: 0,
                patch: 0
            }
        );
    }

    #[test]
    fn test_merge_sorts_and_keeps_merger_identity() {
        let merger = list(vec![token("0xA", 1, "Aave"), token("0xZ", 1, "Zeta")]);
        let merged = list(vec![token("0xB", 137, "Bitcoin")]);

        let combined = merge_token_lists(&merger, &merged);

        let names: Vec<&str> = combined
            .tokens
            .iter()
            .map(|token| token.name.as_str())
            .collect();
        assert_eq!(names, vec!["Aave", "Bitcoin", "Zeta"]);
        assert_eq!(combined.name, merger.name);
        assert_eq!(combined.keywords, merger.keywords);
    }

    #[test]
    fn test_merge_deduplicates_by_address_and_chain() {
        let merger = list(vec![token("0xA", 1, "Aave")]);
        let merged = list(vec![token("0xA", 1, "Aave"), token("0xA", 137, "Aave")]);

        let combined = merge_token_lists(&merger, &merged);

        assert_eq!(combined.tokens.len(), 2);
    }

    #[test]
    fn test_sort_is_ordinal_and_case_sensitive() {
        let mut tokens = vec![
            token("0xA", 1, "aave"),
            token("0xB", 1, "Zeta"),
            token("0xC", 1, "Aave"),
        ];

        sort_tokens(&mut tokens);

        let names: Vec<&str> = tokens.iter().map(|token| token.name.as_str()).collect();
        assert_eq!(names, vec!["Aave", "Zeta", "aave"]);
    }

    #[test]
    fn test_token_record_serialization_field_names() {
        let record = token("0xA", 1, "Aave");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["chainId"], 1);
        assert!(json.get("logoURI").is_none());

        let mut with_logo = token("0xA", 1, "Aave");
        with_logo.logo_uri = Some(String::from("https://example.com/aave.png"));
        let json = serde_json::to_value(&with_logo).unwrap();

        assert_eq!(json["logoURI"], "https://example.com/aave.png");
    }
}
