use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::params::{AuthTokenParams, CancelAllParams, CancelOrderParams, CreateOrderParams};
use crate::protocol::{self, Outcome, Request};
use crate::registry::ClientRegistry;
use crate::signer::SignerLibrary;

/// Routes each request line to its handler.  Stateless routing per
/// call; the only state it carries is the session registry and the
/// signer handle, both owned for the process lifetime.
pub struct Dispatcher {
	signer: Box<dyn SignerLibrary>,
	registry: ClientRegistry,
}

impl Dispatcher {
	pub fn new(signer: Box<dyn SignerLibrary>) -> Self {
		Self {
			signer,
			registry: ClientRegistry::new(),
		}
	}

	pub fn registry(&self) -> &ClientRegistry {
		&self.registry
	}

	/// Process one input line into at most one response object.
	/// Blank lines yield nothing.  Never fails: parse errors, handler
	/// errors, and panics all become error responses.
	pub fn handle_line(&mut self, line: &str) -> Option<Value> {
		if line.is_empty() {
			return None;
		}

		let request = match Request::parse(line) {
			Ok(request) => request,
			Err(err) => return Some(protocol::response(Value::Null, Err(err))),
		};

		let id = request.id.clone();
		debug!(method = %request.method_label(), "dispatching request");

		let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(&request)))
			.unwrap_or_else(|payload| Err(BridgeError::Exception(panic_text(payload))));

		if let Err(err) = &outcome {
			warn!(method = %request.method_label(), error = %err, "request failed");
		}

		Some(protocol::response(id, outcome))
	}

	fn dispatch(&mut self, request: &Request) -> Result<Outcome, BridgeError> {
		let params = &request.params;
		match request.method_name() {
			Some("create_client") => {
				self.registry.ensure_client(self.signer.as_ref(), params)?;
				Ok(Outcome::Ok)
			}
			Some("sign_create_order") => {
				self.registry.ensure_client(self.signer.as_ref(), params)?;
				let order = CreateOrderParams::from_params(params)?;
				Ok(Outcome::Signed(self.signer.sign_create_order(&order)?))
			}
			Some("sign_cancel_order") => {
				self.registry.ensure_client(self.signer.as_ref(), params)?;
				let cancel = CancelOrderParams::from_params(params)?;
				Ok(Outcome::Signed(self.signer.sign_cancel_order(&cancel)?))
			}
			Some("sign_cancel_all") => {
				self.registry.ensure_client(self.signer.as_ref(), params)?;
				let cancel = CancelAllParams::from_params(params)?;
				Ok(Outcome::Signed(self.signer.sign_cancel_all_orders(&cancel)?))
			}
			Some("create_auth_token") => {
				self.registry.ensure_client(self.signer.as_ref(), params)?;
				let auth = AuthTokenParams::from_params(params)?;
				Ok(Outcome::Value(self.signer.create_auth_token(&auth)?))
			}
			_ => Err(BridgeError::UnknownMethod(request.method_label())),
		}
	}
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
	if let Some(text) = payload.downcast_ref::<&str>() {
		(*text).to_owned()
	} else if let Some(text) = payload.downcast_ref::<String>() {
		text.clone()
	} else {
		"unknown panic".to_owned()
	}
}
