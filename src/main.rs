use anyhow::Result;
use build_inspector::cli::Cli;
use build_inspector::output;
use clap::Parser;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting Build Inspector");
    cli.execute().await?;

    Ok(())
}
