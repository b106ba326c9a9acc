use std::io::{self, BufRead, Write};

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::dispatch::Dispatcher;
use crate::error::BridgeError;
use crate::signer::SignedTx;

/// One request line.  Every field is optional on the wire: a missing
/// `id` echoes back as null, a missing `method` falls through dispatch
/// as unknown, and `params` defaults to an empty map.
#[derive(Debug, Deserialize)]
pub struct Request {
	#[serde(default)]
	pub id: Value,
	#[serde(default)]
	pub method: Value,
	#[serde(default)]
	pub params: Map<String, Value>,
}

impl Request {
	/// Parse a line.  Anything that is not a JSON object — bad syntax
	/// or a bare scalar — is an `invalid_json` protocol error.
	pub fn parse(line: &str) -> Result<Self, BridgeError> {
		serde_json::from_str(line).map_err(|e| BridgeError::InvalidJson(e.to_string()))
	}

	/// The method name as dispatched, or `None` for a non-string.
	pub fn method_name(&self) -> Option<&str> {
		self.method.as_str()
	}

	/// The method rendered for an `unknown_method` error.
	pub fn method_label(&self) -> String {
		match self.method.as_str() {
			Some(name) => name.to_owned(),
			None => self.method.to_string(),
		}
	}
}

/// The three success shapes a handler can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// `{"result": "ok"}` — create_client.
	Ok,
	/// `{"result": <string|null>}` — simple string-or-error operations.
	Value(Option<String>),
	/// Composite signed-transaction payload; all three keys are present
	/// even when null.  The record's tx type is not surfaced.
	Signed(SignedTx),
}

/// Render the single response object for a request.  Error responses
/// carry only `id` and `error`; the result keys never coexist with an
/// error.
pub fn response(id: Value, outcome: Result<Outcome, BridgeError>) -> Value {
	match outcome {
		Err(err) => json!({"id": id, "error": err.to_string()}),
		Ok(Outcome::Ok) => json!({"id": id, "result": "ok"}),
		Ok(Outcome::Value(value)) => json!({"id": id, "result": value}),
		Ok(Outcome::Signed(tx)) => json!({
			"id": id,
			"result": tx.tx_info,
			"txHash": tx.tx_hash,
			"messageToSign": tx.message_to_sign,
		}),
	}
}

/// Read one JSON object per input line, dispatch it, and write one JSON
/// object per output line, flushing after every response.  Blank lines
/// produce no output.  Runs until the input side closes.
pub fn run_loop<R: BufRead, W: Write>(
	reader: R,
	mut writer: W,
	dispatcher: &mut Dispatcher,
) -> io::Result<()> {
	for line in reader.lines() {
		let line = line?;
		let response = match dispatcher.handle_line(line.trim()) {
			Some(response) => response,
			None => continue,
		};
		writeln!(writer, "{response}")?;
		writer.flush()?;
	}
	Ok(())
}
