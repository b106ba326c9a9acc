use serde_json::{Map, Value};

use crate::error::BridgeError;

/// Coerce a JSON value into an i64 the way the signer expects its
/// numeric arguments: integers pass through, floats truncate, numeric
/// strings parse, booleans map to 0/1.
fn coerce_i64(value: &Value) -> Option<i64> {
	match value {
		Value::Number(n) => n
			.as_i64()
			.or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
			.or_else(|| n.as_f64().map(|f| f as i64)),
		Value::String(s) => s.trim().parse().ok(),
		Value::Bool(b) => Some(i64::from(*b)),
		_ => None,
	}
}

/// Fetch a required 64-bit integer param.
pub fn require_i64(params: &Map<String, Value>, field: &str) -> Result<i64, BridgeError> {
	params
		.get(field)
		.and_then(coerce_i64)
		.ok_or_else(|| BridgeError::InvalidParams(field.to_owned()))
}

/// Fetch a required 32-bit integer param.  Values outside `c_int` range
/// are rejected rather than truncated at the ABI.
pub fn require_i32(params: &Map<String, Value>, field: &str) -> Result<i32, BridgeError> {
	let wide = require_i64(params, field)?;
	i32::try_from(wide).map_err(|_| BridgeError::InvalidParams(field.to_owned()))
}

/// Fetch a required string param.
pub fn require_str<'p>(
	params: &'p Map<String, Value>,
	field: &str,
) -> Result<&'p str, BridgeError> {
	params
		.get(field)
		.and_then(Value::as_str)
		.ok_or_else(|| BridgeError::InvalidParams(field.to_owned()))
}

// -- Per-operation parameter structs --

/// Arguments for SignCreateOrder, in the library's positional order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderParams {
	pub market_index: i32,
	pub client_order_index: i64,
	pub base_amount: i64,
	pub price: i32,
	pub is_ask: i32,
	pub order_type: i32,
	pub time_in_force: i32,
	pub reduce_only: i32,
	pub trigger_price: i32,
	pub order_expiry: i64,
	pub nonce: i64,
	pub api_key_index: i32,
	pub account_index: i64,
}

impl CreateOrderParams {
	pub fn from_params(params: &Map<String, Value>) -> Result<Self, BridgeError> {
		Ok(Self {
			market_index: require_i32(params, "marketIndex")?,
			client_order_index: require_i64(params, "clientOrderIndex")?,
			base_amount: require_i64(params, "baseAmount")?,
			price: require_i32(params, "price")?,
			is_ask: require_i32(params, "isAsk")?,
			order_type: require_i32(params, "orderType")?,
			time_in_force: require_i32(params, "timeInForce")?,
			reduce_only: require_i32(params, "reduceOnly")?,
			trigger_price: require_i32(params, "triggerPrice")?,
			order_expiry: require_i64(params, "orderExpiry")?,
			nonce: require_i64(params, "nonce")?,
			api_key_index: require_i32(params, "apiKeyIndex")?,
			account_index: require_i64(params, "accountIndex")?,
		})
	}
}

/// Arguments for SignCancelOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOrderParams {
	pub market_index: i32,
	pub order_index: i64,
	pub nonce: i64,
	pub api_key_index: i32,
	pub account_index: i64,
}

impl CancelOrderParams {
	pub fn from_params(params: &Map<String, Value>) -> Result<Self, BridgeError> {
		Ok(Self {
			market_index: require_i32(params, "marketIndex")?,
			order_index: require_i64(params, "orderIndex")?,
			nonce: require_i64(params, "nonce")?,
			api_key_index: require_i32(params, "apiKeyIndex")?,
			account_index: require_i64(params, "accountIndex")?,
		})
	}
}

/// Arguments for SignCancelAllOrders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAllParams {
	pub time_in_force: i32,
	pub scheduled_time: i64,
	pub nonce: i64,
	pub api_key_index: i32,
	pub account_index: i64,
}

impl CancelAllParams {
	pub fn from_params(params: &Map<String, Value>) -> Result<Self, BridgeError> {
		Ok(Self {
			time_in_force: require_i32(params, "timeInForce")?,
			scheduled_time: require_i64(params, "scheduledTime")?,
			nonce: require_i64(params, "nonce")?,
			api_key_index: require_i32(params, "apiKeyIndex")?,
			account_index: require_i64(params, "accountIndex")?,
		})
	}
}

/// Arguments for CreateAuthToken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokenParams {
	pub deadline_ms: i64,
	pub api_key_index: i32,
	pub account_index: i64,
}

impl AuthTokenParams {
	pub fn from_params(params: &Map<String, Value>) -> Result<Self, BridgeError> {
		Ok(Self {
			deadline_ms: require_i64(params, "deadlineMs")?,
			api_key_index: require_i32(params, "apiKeyIndex")?,
			account_index: require_i64(params, "accountIndex")?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn map(value: Value) -> Map<String, Value> {
		value.as_object().unwrap().clone()
	}

	#[test]
	fn integers_coerce_from_loose_json() {
		let params = map(json!({
			"int": 7,
			"float": 7.9,
			"string": "7",
			"padded": " 7 ",
			"yes": true,
			"no": false,
		}));
		assert_eq!(require_i64(&params, "int").unwrap(), 7);
		assert_eq!(require_i64(&params, "float").unwrap(), 7);
		assert_eq!(require_i64(&params, "string").unwrap(), 7);
		assert_eq!(require_i64(&params, "padded").unwrap(), 7);
		assert_eq!(require_i64(&params, "yes").unwrap(), 1);
		assert_eq!(require_i64(&params, "no").unwrap(), 0);
	}

	#[test]
	fn garbage_is_rejected_with_the_field_name() {
		let params = map(json!({"price": "abc", "nested": {}, "list": []}));

		for field in ["price", "nested", "list", "missing"] {
			let err = require_i64(&params, field).unwrap_err();
			assert_eq!(err.to_string(), format!("invalid_params:{field}"));
		}
	}

	#[test]
	fn i32_range_is_enforced() {
		let params = map(json!({"small": 42, "big": 3_000_000_000_i64}));
		assert_eq!(require_i32(&params, "small").unwrap(), 42);
		assert_eq!(
			require_i32(&params, "big").unwrap_err().to_string(),
			"invalid_params:big"
		);
	}

	#[test]
	fn strings_must_be_json_strings() {
		let params = map(json!({"baseUrl": "https://x", "privateKey": 5}));
		assert_eq!(require_str(&params, "baseUrl").unwrap(), "https://x");
		assert!(require_str(&params, "privateKey").is_err());
	}

	#[test]
	fn create_order_params_take_all_thirteen_fields() {
		let params = map(json!({
			"marketIndex": 1,
			"clientOrderIndex": 2,
			"baseAmount": 300,
			"price": 4500,
			"isAsk": 1,
			"orderType": 0,
			"timeInForce": 1,
			"reduceOnly": 0,
			"triggerPrice": 0,
			"orderExpiry": 1_700_000_000_000_i64,
			"nonce": 99,
			"apiKeyIndex": 3,
			"accountIndex": 12,
		}));

		let order = CreateOrderParams::from_params(&params).unwrap();
		assert_eq!(order.market_index, 1);
		assert_eq!(order.client_order_index, 2);
		assert_eq!(order.base_amount, 300);
		assert_eq!(order.order_expiry, 1_700_000_000_000);
		assert_eq!(order.api_key_index, 3);
		assert_eq!(order.account_index, 12);
	}

	#[test]
	fn missing_field_names_the_culprit() {
		let params = map(json!({
			"marketIndex": 1,
			"orderIndex": 10,
			"apiKeyIndex": 0,
			"accountIndex": 0,
		}));
		let err = CancelOrderParams::from_params(&params).unwrap_err();
		assert_eq!(err.to_string(), "invalid_params:nonce");
	}

	#[test]
	fn auth_token_params_parse() {
		let params = map(json!({
			"deadlineMs": "1700000000000",
			"apiKeyIndex": 2,
			"accountIndex": 7,
		}));
		let auth = AuthTokenParams::from_params(&params).unwrap();
		assert_eq!(auth.deadline_ms, 1_700_000_000_000);
		assert_eq!(auth.api_key_index, 2);
		assert_eq!(auth.account_index, 7);
	}
}
