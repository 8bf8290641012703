use anyhow::Result;
use clap::Parser;

use crate::chains::{get_chain, Chain, CHAINS};
use crate::ipfs::FleekConfig;

#[derive(Parser, Debug)]
#[command(
    name = "Tokenlist Generator",
    about = "Generates versioned ERC20 tokenlists for EVM compatible chains."
)]
pub struct Args {
    #[arg(short, long, help = "Start log with debug", default_value_t = false)]
    pub debug: bool,

    #[arg(short, long, help = "Chain name to build the lists for")]
    pub chain: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub debug: bool,
    pub chains: Vec<Chain>,
    pub fleek: FleekConfig,
}

impl Config {
    pub fn new() -> Result<Self> {
        let args = Args::parse();

        let chains = match args.chain {
            Some(chain) => vec![get_chain(chain)?],
            None => CHAINS.to_vec(),
        };

        Ok(Self {
            debug: args.debug,
            chains,
            fleek: FleekConfig::from_env(),
        })
    }
}
