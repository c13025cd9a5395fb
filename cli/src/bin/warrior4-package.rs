//! warrior4-package - package disk images into a virtual appliance

use clap::Parser;
use warrior4_tools::app;
use warrior4_tools::cli::PackageCli;

#[tokio::main]
async fn main() {
    let cli = PackageCli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(app::exit_code(&e));
    }
}
