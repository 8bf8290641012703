use std::collections::HashMap;

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy)]
pub struct Chain {
    pub id: i64,
    pub name: &'static str,
    pub public_rpc: &'static str,
    pub multicall: &'static str,
    pub coingecko_platform: &'static str,
    pub trustwallet_blockchain: &'static str,
}

impl Chain {
    pub fn new_from_borrowed(chain: &Chain) -> Self {
        Self {
            id: chain.id,
            name: chain.name,
            public_rpc: chain.public_rpc,
            multicall: chain.multicall,
            coingecko_platform: chain.coingecko_platform,
            trustwallet_blockchain: chain.trustwallet_blockchain,
        }
    }

    pub fn supports_coingecko(&self) -> bool {
        !self.coingecko_platform.is_empty()
    }
}

pub const HOMESTEAD: Chain = Chain {
    id: 1,
    name: "homestead",
    public_rpc: "https://eth.llamarpc.com",
    multicall: "0x5BA1e12693Dc8F9c48aAD8770482f4739bEeD696",
    coingecko_platform: "ethereum",
    trustwallet_blockchain: "ethereum",
};

pub const GOERLI: Chain = Chain {
    id: 5,
    name: "goerli",
    public_rpc: "https://rpc.ankr.com/eth_goerli",
    multicall: "0x5BA1e12693Dc8F9c48aAD8770482f4739bEeD696",
    coingecko_platform: "",
    trustwallet_blockchain: "ethereum",
};

pub const POLYGON: Chain = Chain {
    id: 137,
    name: "polygon",
    public_rpc: "https://polygon.llamarpc.com",
    multicall: "0xe2530198A125Dcdc8Fc5476e07BFDFb5203f1102",
    coingecko_platform: "polygon-pos",
    trustwallet_blockchain: "polygon",
};

pub const ARBITRUM: Chain = Chain {
    id: 42161,
    name: "arbitrum",
    public_rpc: "https://rpc.ankr.com/arbitrum",
    multicall: "0xd67950096d029AF421A946fFB1E04C94CAf8E256",
    coingecko_platform: "arbitrum-one",
    trustwallet_blockchain: "ethereum",
};

pub const OPTIMISM: Chain = Chain {
    id: 10,
    name: "optimism",
    public_rpc: "https://rpc.ankr.com/optimism",
    multicall: "0x2Dc0E2aa608532Da689e89e237dF582B783E552C",
    coingecko_platform: "optimistic-ethereum",
    trustwallet_blockchain: "ethereum",
};

pub static CHAINS: [Chain; 5] = [HOMESTEAD, GOERLI, POLYGON, ARBITRUM, OPTIMISM];

pub fn get_chains() -> HashMap<String, Chain> {
    let mut chains: HashMap<String, Chain> = HashMap::new();

    for chain in CHAINS.into_iter() {
        chains.insert(String::from(chain.name), chain);
    }

    chains
}

pub fn get_chain(chain: String) -> Result<Chain> {
    let mut chainname = chain;

    if chainname == "mainnet" || chainname == "ethereum" {
        chainname = String::from("homestead");
    }

    let chains = get_chains();

    let selected_chain = chains
        .get(&chainname)
        .ok_or_else(|| anyhow!("Invalid chain name: {}", chainname))?;

    Ok(Chain::new_from_borrowed(selected_chain))
}
