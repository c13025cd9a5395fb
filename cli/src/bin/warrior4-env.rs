//! warrior4-env - run build scripts within a Docker build environment

use clap::Parser;
use warrior4_tools::app;
use warrior4_tools::cli::EnvCli;

#[tokio::main]
async fn main() {
    let cli = EnvCli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(app::exit_code(&e));
    }
}
