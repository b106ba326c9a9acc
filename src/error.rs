use crate::signer::SignerError;

/// Every failure a request can produce, rendered exactly as it appears
/// in the response's `error` field.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	/// The input line was not a JSON object.
	#[error("invalid_json:{0}")]
	InvalidJson(String),

	/// The request named a method outside the fixed dispatch table.
	#[error("unknown_method:{0}")]
	UnknownMethod(String),

	/// A privileged call arrived for an API key index that has never
	/// been supplied credentials.
	#[error("client_not_initialized")]
	ClientNotInitialized,

	/// A required param was missing or could not be coerced.
	#[error("invalid_params:{0}")]
	InvalidParams(String),

	/// The signer library reported an error; the text is surfaced
	/// verbatim.
	#[error("{0}")]
	Signer(#[from] SignerError),

	/// A handler panicked; caught at the dispatch boundary.
	#[error("exception:{0}")]
	Exception(String),
}
