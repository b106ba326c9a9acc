pub mod native;

use crate::params::{AuthTokenParams, CancelAllParams, CancelOrderParams, CreateOrderParams};

/// An error reported by the signer library.  The text travels to the
/// caller verbatim as the response's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SignerError(pub String);

/// A composite signed-transaction record returned by the sign
/// operations.  `tx_type` is part of the foreign record but is not
/// surfaced in responses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignedTx {
	pub tx_type: u8,
	pub tx_info: Option<String>,
	pub tx_hash: Option<String>,
	pub message_to_sign: Option<String>,
}

/// The five operations the signer library exposes.  The production
/// implementation delegates every call to the loaded shared library;
/// tests substitute scripted implementations.
///
/// All calls are synchronous and blocking — the bridge processes one
/// request at a time, so the library is only ever entered from a single
/// thread of control.
pub trait SignerLibrary {
	/// Establish (or re-establish) the signing context for an API key.
	/// Cheap and idempotent; issued before every privileged call.
	fn create_client(
		&self,
		base_url: &str,
		private_key: &str,
		chain_id: i32,
		api_key_index: i32,
		account_index: i64,
	) -> Result<(), SignerError>;

	fn sign_create_order(&self, order: &CreateOrderParams) -> Result<SignedTx, SignerError>;

	fn sign_cancel_order(&self, cancel: &CancelOrderParams) -> Result<SignedTx, SignerError>;

	fn sign_cancel_all_orders(&self, cancel: &CancelAllParams) -> Result<SignedTx, SignerError>;

	/// Produce an auth token; the only operation with a plain
	/// string-or-error result.
	fn create_auth_token(&self, auth: &AuthTokenParams) -> Result<Option<String>, SignerError>;
}
