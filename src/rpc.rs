use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use ethabi::{Contract, ParamType, Token};
use jsonrpsee::core::{client::ClientT, rpc_params};
use jsonrpsee_http_client::{HttpClient, HttpClientBuilder};
use log::info;
use serde_json::json;

use crate::chains::Chain;

pub const MULTICALL_BATCH_SIZE: usize = 50;
pub const RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const UNKNOWN_SENTINEL: &str = "UNKNOWN";
pub const DEFAULT_DECIMALS: i64 = 18;

static ERC20_ABI: &[u8] = include_bytes!("res/abi/erc20.json");
static MULTICALL_ABI: &[u8] = include_bytes!("res/abi/multicall.json");

#[derive(Debug, Clone, PartialEq)]
pub struct OnchainMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: i64,
}

impl OnchainMetadata {
    /// True when any string field fell through every decode attempt.
    pub fn is_degraded(&self) -> bool {
        self.name == UNKNOWN_SENTINEL || self.symbol == UNKNOWN_SENTINEL
    }
}

#[derive(Debug, Clone)]
pub struct Rpc {
    client: HttpClient,
    erc20: Contract,
    multicall: Contract,
    chain: Chain,
}

impl Rpc {
    pub async fn new(chain: &Chain) -> Result<Self> {
        info!("Starting {} rpc service", chain.name);

        let client = HttpClientBuilder::default()
            .request_timeout(RPC_REQUEST_TIMEOUT)
            .build(chain.public_rpc)
            .with_context(|| format!("Unable to build an rpc client for {}", chain.name))?;

        let response: serde_json::Value = client
            .request("eth_chainId", rpc_params![])
            .await
            .with_context(|| format!("Unable to reach the {} rpc provider", chain.name))?;

        let chain_id = parse_quantity(&response)?;

        if chain_id != chain.id {
            return Err(anyhow!(
                "The {} rpc endpoint reports chain id {} instead of {}",
                chain.name,
                chain_id,
                chain.id
            ));
        }

        Ok(Self {
            client,
            erc20: Contract::load(ERC20_ABI).expect("Invalid embedded ERC20 ABI"),
            multicall: Contract::load(MULTICALL_ABI).expect("Invalid embedded multicall ABI"),
            chain: Chain::new_from_borrowed(chain),
        })
    }

    /// Resolves name/symbol/decimals for every address through the chain's
    /// multicall aggregator. Sub-calls are allowed to fail per address; a
    /// failed or undecodable response degrades to sentinel values. Only a
    /// transport or provider error fails the whole resolution.
    pub async fn get_tokens_metadata(
        &self,
        addresses: &[String],
    ) -> Result<HashMap<String, OnchainMetadata>> {
        let name_call = self.encode_erc20_call("name")?;
        let symbol_call = self.encode_erc20_call("symbol")?;
        let decimals_call = self.encode_erc20_call("decimals")?;

        let mut tokens_metadata: HashMap<String, OnchainMetadata> = HashMap::new();

        for chunk in addresses.chunks(MULTICALL_BATCH_SIZE) {
            let mut calls: Vec<Token> = Vec::new();

            for address in chunk {
                let target = parse_abi_address(address)?;

                for call_data in [&name_call, &symbol_call, &decimals_call] {
                    calls.push(Token::Tuple(vec![
                        Token::Address(target),
                        Token::Bytes(call_data.clone()),
                    ]));
                }
            }

            let try_aggregate = self
                .multicall
                .function("tryAggregate")
                .expect("Invalid embedded multicall ABI");

            let call_data = try_aggregate
                .encode_input(&[Token::Bool(false), Token::Array(calls)])
                .map_err(|err| anyhow!("Unable to encode multicall input: {}", err))?;

            let response: serde_json::Value = self
                .client
                .request(
                    "eth_call",
                    rpc_params![
                        json!({
                            "to": self.chain.multicall,
                            "data": format!("0x{}", hex::encode(&call_data)),
                        }),
                        "latest"
                    ],
                )
                .await
                .with_context(|| {
                    format!("Multicall aggregation failed on {}", self.chain.name)
                })?;

            let raw_output = decode_hex_response(&response)?;

            let output = try_aggregate
                .decode_output(&raw_output)
                .map_err(|err| anyhow!("Unable to decode multicall output: {}", err))?;

            let returns = match output.into_iter().next() {
                Some(Token::Array(returns)) => returns,
                _ => return Err(anyhow!("Malformed multicall output")),
            };

            if returns.len() != chunk.len() * 3 {
                return Err(anyhow!(
                    "Multicall returned {} results for {} calls",
                    returns.len(),
                    chunk.len() * 3
                ));
            }

            for (index, address) in chunk.iter().enumerate() {
                let name_data = call_return_data(&returns[3 * index]);
                let symbol_data = call_return_data(&returns[3 * index + 1]);
                let decimals_data = call_return_data(&returns[3 * index + 2]);

                tokens_metadata.insert(
                    address.clone(),
                    decode_erc20_metadata(&name_data, &symbol_data, &decimals_data),
                );
            }
        }

        Ok(tokens_metadata)
    }

    fn encode_erc20_call(&self, name: &str) -> Result<Vec<u8>> {
        let function = self
            .erc20
            .function(name)
            .expect("Invalid embedded ERC20 ABI");

        function
            .encode_input(&[])
            .map_err(|err| anyhow!("Unable to encode {} call: {}", name, err))
    }
}

/// Per-field decoding with the fallback chain the non-standard ERC20
/// deployments require: ABI string, then fixed-width bytes32, then the
/// sentinel. Decimals fall back to 18.
pub fn decode_erc20_metadata(
    name_data: &[u8],
    symbol_data: &[u8],
    decimals_data: &[u8],
) -> OnchainMetadata {
    OnchainMetadata {
        name: decode_string_response(name_data),
        symbol: decode_string_response(symbol_data),
        decimals: decode_decimals_response(decimals_data),
    }
}

fn decode_string_response(data: &[u8]) -> String {
    match ethabi::decode(&[ParamType::String], data) {
        Ok(tokens) => match tokens.into_iter().next() {
            Some(Token::String(value)) => {
                let trimmed = value.trim_matches(char::from(0));

                if trimmed.is_empty() {
                    String::from(UNKNOWN_SENTINEL)
                } else {
                    trimmed.to_string()
                }
            }
            _ => String::from(UNKNOWN_SENTINEL),
        },
        Err(_) => decode_bytes32_response(data),
    }
}

fn decode_bytes32_response(data: &[u8]) -> String {
    if data.len() != 32 {
        return String::from(UNKNOWN_SENTINEL);
    }

    match String::from_utf8(data.to_vec()) {
        Ok(value) => {
            let trimmed = value.trim_matches(char::from(0));

            if trimmed.is_empty() {
                String::from(UNKNOWN_SENTINEL)
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => String::from(UNKNOWN_SENTINEL),
    }
}

fn decode_decimals_response(data: &[u8]) -> i64 {
    match ethabi::decode(&[ParamType::Uint(256)], data) {
        Ok(tokens) => match tokens.into_iter().next() {
            Some(Token::Uint(value)) => value.low_u64() as i64,
            _ => DEFAULT_DECIMALS,
        },
        Err(_) => DEFAULT_DECIMALS,
    }
}

fn call_return_data(token: &Token) -> Vec<u8> {
    match token {
        Token::Tuple(fields) => match fields.get(1) {
            Some(Token::Bytes(data)) => data.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn parse_abi_address(address: &str) -> Result<ethabi::Address> {
    let stripped = address.strip_prefix("0x").unwrap_or(address);

    let bytes = hex::decode(stripped).map_err(|_| anyhow!("Invalid address: {}", address))?;

    if bytes.len() != 20 {
        return Err(anyhow!("Invalid address length: {}", address));
    }

    Ok(ethabi::Address::from_slice(&bytes))
}

fn parse_quantity(value: &serde_json::Value) -> Result<i64> {
    let quantity = value
        .as_str()
        .ok_or_else(|| anyhow!("Malformed rpc quantity: {}", value))?;

    let stripped = quantity.strip_prefix("0x").unwrap_or(quantity);

    i64::from_str_radix(stripped, 16)
        .map_err(|_| anyhow!("Malformed rpc quantity: {}", quantity))
}

fn decode_hex_response(value: &serde_json::Value) -> Result<Vec<u8>> {
    let data = value
        .as_str()
        .ok_or_else(|| anyhow!("Malformed eth_call response: {}", value))?;

    let stripped = data.strip_prefix("0x").unwrap_or(data);

    hex::decode(stripped).map_err(|_| anyhow!("Malformed eth_call response: {}", data))
}
