use std::collections::{HashMap, HashSet};
use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::BridgeError;
use crate::params::{require_i32, require_i64, require_str};
use crate::signer::SignerLibrary;

/// Signing credentials for one API key index.  Supplied once and reused
/// across calls; re-supplying both `baseUrl` and `privateKey` replaces
/// the whole entry.
#[derive(Clone)]
pub struct SigningConfig {
	pub base_url: String,
	pub private_key: String,
	pub chain_id: i32,
	pub account_index: i64,
}

// Key material must never reach logs or error output.
impl fmt::Debug for SigningConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SigningConfig")
			.field("base_url", &self.base_url)
			.field("private_key", &"<redacted>")
			.field("chain_id", &self.chain_id)
			.field("account_index", &self.account_index)
			.finish()
	}
}

/// Per-process registry of signing contexts, keyed by API key index.
/// Only ever touched from the single sequential dispatch path, so it
/// needs no locking.
#[derive(Default)]
pub struct ClientRegistry {
	configs: HashMap<i32, SigningConfig>,
	initialized: HashSet<i32>,
}

impl ClientRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Guarantee the signer library holds a client context for the API
	/// key named in `params` before any privileged call.
	///
	/// Credentials in `params` (both `baseUrl` and `privateKey`)
	/// overwrite the stored entry; with no stored entry and none
	/// supplied, the call fails with `client_not_initialized`.
	/// CreateClient is issued on every invocation that reaches this
	/// step, not only the first.
	pub fn ensure_client(
		&mut self,
		signer: &dyn SignerLibrary,
		params: &Map<String, Value>,
	) -> Result<(), BridgeError> {
		let api_key_index = require_i32(params, "apiKeyIndex")?;

		if params.contains_key("baseUrl") && params.contains_key("privateKey") {
			let config = SigningConfig {
				base_url: require_str(params, "baseUrl")?.to_owned(),
				private_key: require_str(params, "privateKey")?.to_owned(),
				chain_id: require_i32(params, "chainId")?,
				account_index: require_i64(params, "accountIndex")?,
			};
			self.configs.insert(api_key_index, config);
			debug!(api_key_index, "stored signing config");
		}

		let config = self
			.configs
			.get(&api_key_index)
			.ok_or(BridgeError::ClientNotInitialized)?;

		signer.create_client(
			&config.base_url,
			&config.private_key,
			config.chain_id,
			api_key_index,
			config.account_index,
		)?;

		self.initialized.insert(api_key_index);
		Ok(())
	}

	/// Whether CreateClient has ever succeeded for this key.
	pub fn is_initialized(&self, api_key_index: i32) -> bool {
		self.initialized.contains(&api_key_index)
	}

	/// The stored config for a key, if any.
	pub fn config(&self, api_key_index: i32) -> Option<&SigningConfig> {
		self.configs.get(&api_key_index)
	}

	/// Number of stored configs.
	pub fn len(&self) -> usize {
		self.configs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.configs.is_empty()
	}
}
