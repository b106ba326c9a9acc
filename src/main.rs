use std::io::{self, Write};

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lighter_signer_bridge::dispatch::Dispatcher;
use lighter_signer_bridge::{loader, protocol};

fn main() -> Result<()> {
	init_logging();

	// Load failures are fatal, but the parent still gets one parseable
	// frame on stdout before the non-zero exit.
	let signer = match loader::load() {
		Ok(signer) => signer,
		Err(err) => {
			let frame = serde_json::json!({
				"id": null,
				"error": format!("failed_to_load_signer:{err:#}"),
			});
			println!("{frame}");
			io::stdout().flush().ok();
			std::process::exit(1);
		}
	};
	info!("signer library loaded");

	let mut dispatcher = Dispatcher::new(Box::new(signer));
	let stdin = io::stdin();
	let stdout = io::stdout();
	protocol::run_loop(stdin.lock(), stdout.lock(), &mut dispatcher)?;
	Ok(())
}

/// Logs go to stderr; stdout carries only protocol frames.
fn init_logging() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();
}
