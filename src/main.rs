//! Zoho Projects relay server.

// std
use std::sync::Arc;
// self
use zoho_relay::{config::RelayConfig, flows::Relay, obs, server};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	obs::init_subscriber();

	let config = RelayConfig::load();
	let relay = Arc::new(Relay::new(&config)?);

	server::serve(relay, config.listen).await?;

	Ok(())
}
