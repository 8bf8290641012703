use dotenv::dotenv;
use evm_tokenlists::generator::{merge_generated_lists, ListClass};
use log::*;
use simple_logger::SimpleLogger;

fn main() {
    dotenv().ok();

    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    info!("Starting Tokenlist Merger");

    for list_class in [ListClass::Listed, ListClass::Vetted] {
        if let Err(err) = merge_generated_lists(list_class) {
            error!(
                "Unable to merge the {} tokenlists: {:#}",
                list_class.as_str(),
                err
            );
            std::process::exit(1);
        }
    }
}
