use anyhow::Context;
use clap::Parser;
use log::info;

use sqlgate::api::GatewayApi;
use sqlgate::conf::Config;
use sqlgate::core::{CliArgs, setup_logging};
use sqlgate::service::GatewayService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = Config::load(args.config.as_deref()).context("loading configuration")?;
    setup_logging(&config.logging)?;
    info!(args = args; "sqlgate started.");

    let service = GatewayService::new(&config)
        .await
        .context("connecting to the database")?;
    let api = GatewayApi::new(service, config.auth.clone());
    api.serve(&config.server.addr()).await?;

    info!("sqlgate stopped.");
    Ok(())
}
