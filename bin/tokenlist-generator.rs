use dotenv::dotenv;
use evm_tokenlists::{config::Config, generator};
use log::*;
use simple_logger::SimpleLogger;

#[tokio::main()]
async fn main() {
    dotenv().ok();

    let log = SimpleLogger::new().with_level(LevelFilter::Info);

    let config = match Config::new() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    if config.debug {
        log.with_level(LevelFilter::Debug).init().unwrap();
    } else {
        log.init().unwrap();
    }

    info!("Starting Tokenlist Generator");

    let mut failed = false;

    for chain in config.chains.clone() {
        match generator::build_network_lists(&chain, &config).await {
            Ok(_) => info!("Finished the {} tokenlists", chain.name),
            Err(err) => {
                error!("Unable to build the {} tokenlists: {:#}", chain.name, err);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
