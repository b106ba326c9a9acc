use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_longlong};

use libloading::{Library, Symbol};

use super::{SignedTx, SignerError, SignerLibrary};
use crate::params::{AuthTokenParams, CancelAllParams, CancelOrderParams, CreateOrderParams};

// -- Foreign result layouts --

/// Mirror of the library's `StrOrErr` struct.
#[repr(C)]
struct RawStrOrErr {
	value: *const c_char,
	err: *const c_char,
}

/// Mirror of the library's `SignedTxResponse` struct.
#[repr(C)]
struct RawSignedTx {
	tx_type: u8,
	tx_info: *const c_char,
	tx_hash: *const c_char,
	message_to_sign: *const c_char,
	err: *const c_char,
}

// -- Foreign function signatures --

type CreateClientFn = unsafe extern "C" fn(
	*const c_char, // baseUrl
	*const c_char, // privateKey
	c_int,         // chainId
	c_int,         // apiKeyIndex
	c_longlong,    // accountIndex
) -> *const c_char;

type SignCreateOrderFn = unsafe extern "C" fn(
	c_int,      // marketIndex
	c_longlong, // clientOrderIndex
	c_longlong, // baseAmount
	c_int,      // price
	c_int,      // isAsk
	c_int,      // orderType
	c_int,      // timeInForce
	c_int,      // reduceOnly
	c_int,      // triggerPrice
	c_longlong, // orderExpiry
	c_longlong, // nonce
	c_int,      // apiKeyIndex
	c_longlong, // accountIndex
) -> RawSignedTx;

type SignCancelOrderFn = unsafe extern "C" fn(
	c_int,      // marketIndex
	c_longlong, // orderIndex
	c_longlong, // nonce
	c_int,      // apiKeyIndex
	c_longlong, // accountIndex
) -> RawSignedTx;

type SignCancelAllOrdersFn = unsafe extern "C" fn(
	c_int,      // timeInForce
	c_longlong, // scheduledTime
	c_longlong, // nonce
	c_int,      // apiKeyIndex
	c_longlong, // accountIndex
) -> RawSignedTx;

type CreateAuthTokenFn = unsafe extern "C" fn(
	c_longlong, // deadlineMs
	c_int,      // apiKeyIndex
	c_longlong, // accountIndex
) -> RawStrOrErr;

// -- Decoding --

/// Decode a foreign C string.  Null and empty both decode to `None`;
/// invalid UTF-8 is replaced rather than rejected.
fn decode(ptr: *const c_char) -> Option<String> {
	if ptr.is_null() {
		return None;
	}
	// SAFETY: the library returns NUL-terminated strings that stay
	// valid for the lifetime of the process.
	let decoded = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
	if decoded.is_empty() {
		None
	} else {
		Some(decoded)
	}
}

fn decode_err(ptr: *const c_char) -> Result<(), SignerError> {
	match decode(ptr) {
		Some(text) => Err(SignerError(text)),
		None => Ok(()),
	}
}

impl RawSignedTx {
	fn into_result(self) -> Result<SignedTx, SignerError> {
		decode_err(self.err)?;
		Ok(SignedTx {
			tx_type: self.tx_type,
			tx_info: decode(self.tx_info),
			tx_hash: decode(self.tx_hash),
			message_to_sign: decode(self.message_to_sign),
		})
	}
}

impl RawStrOrErr {
	fn into_result(self) -> Result<Option<String>, SignerError> {
		decode_err(self.err)?;
		Ok(decode(self.value))
	}
}

fn c_string(field: &str, value: &str) -> Result<CString, SignerError> {
	CString::new(value).map_err(|_| SignerError(format!("{field} contains an interior nul byte")))
}

// -- Adapter --

/// Signs by calling into the Lighter signer shared library through its
/// C ABI.  Holds the loaded library for the lifetime of the process;
/// symbols are resolved per call.
pub struct NativeSigner {
	lib: Library,
}

impl NativeSigner {
	pub fn new(lib: Library) -> Self {
		Self { lib }
	}

	fn symbol<T>(&self, name: &[u8]) -> Result<Symbol<'_, T>, SignerError> {
		// SAFETY: every caller pairs the symbol name with the exact
		// function signature the library exports for it.
		unsafe { self.lib.get(name) }.map_err(|e| {
			let name = String::from_utf8_lossy(name);
			let name = name.trim_end_matches('\0');
			SignerError(format!("signer library does not export {name}: {e}"))
		})
	}
}

impl SignerLibrary for NativeSigner {
	fn create_client(
		&self,
		base_url: &str,
		private_key: &str,
		chain_id: i32,
		api_key_index: i32,
		account_index: i64,
	) -> Result<(), SignerError> {
		let base_url = c_string("baseUrl", base_url)?;
		let private_key = c_string("privateKey", private_key)?;
		let func: Symbol<'_, CreateClientFn> = self.symbol(b"CreateClient\0")?;
		// SAFETY: argument types match the declared C signature; the
		// CStrings outlive the call.
		let err = unsafe {
			func(
				base_url.as_ptr(),
				private_key.as_ptr(),
				chain_id,
				api_key_index,
				account_index,
			)
		};
		decode_err(err)
	}

	fn sign_create_order(&self, order: &CreateOrderParams) -> Result<SignedTx, SignerError> {
		let func: Symbol<'_, SignCreateOrderFn> = self.symbol(b"SignCreateOrder\0")?;
		// SAFETY: argument types match the declared C signature.
		let raw = unsafe {
			func(
				order.market_index,
				order.client_order_index,
				order.base_amount,
				order.price,
				order.is_ask,
				order.order_type,
				order.time_in_force,
				order.reduce_only,
				order.trigger_price,
				order.order_expiry,
				order.nonce,
				order.api_key_index,
				order.account_index,
			)
		};
		raw.into_result()
	}

	fn sign_cancel_order(&self, cancel: &CancelOrderParams) -> Result<SignedTx, SignerError> {
		let func: Symbol<'_, SignCancelOrderFn> = self.symbol(b"SignCancelOrder\0")?;
		// SAFETY: argument types match the declared C signature.
		let raw = unsafe {
			func(
				cancel.market_index,
				cancel.order_index,
				cancel.nonce,
				cancel.api_key_index,
				cancel.account_index,
			)
		};
		raw.into_result()
	}

	fn sign_cancel_all_orders(&self, cancel: &CancelAllParams) -> Result<SignedTx, SignerError> {
		let func: Symbol<'_, SignCancelAllOrdersFn> = self.symbol(b"SignCancelAllOrders\0")?;
		// SAFETY: argument types match the declared C signature.
		let raw = unsafe {
			func(
				cancel.time_in_force,
				cancel.scheduled_time,
				cancel.nonce,
				cancel.api_key_index,
				cancel.account_index,
			)
		};
		raw.into_result()
	}

	fn create_auth_token(&self, auth: &AuthTokenParams) -> Result<Option<String>, SignerError> {
		let func: Symbol<'_, CreateAuthTokenFn> = self.symbol(b"CreateAuthToken\0")?;
		// SAFETY: argument types match the declared C signature.
		let raw = unsafe { func(auth.deadline_ms, auth.api_key_index, auth.account_index) };
		raw.into_result()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::ptr;

	#[test]
	fn null_and_empty_strings_decode_to_none() {
		assert_eq!(decode(ptr::null()), None);

		let empty = CString::new("").unwrap();
		assert_eq!(decode(empty.as_ptr()), None);

		let text = CString::new("hello").unwrap();
		assert_eq!(decode(text.as_ptr()).as_deref(), Some("hello"));
	}

	#[test]
	fn invalid_utf8_is_replaced_not_rejected() {
		let bytes = CString::new(vec![0xff, 0xfe, b'o', b'k']).unwrap();
		let decoded = decode(bytes.as_ptr()).unwrap();
		assert!(decoded.ends_with("ok"));
		assert!(decoded.contains('\u{fffd}'));
	}

	#[test]
	fn signed_tx_error_wins_over_payload() {
		let err = CString::new("insufficient_margin").unwrap();
		let info = CString::new("{\"x\":1}").unwrap();
		let raw = RawSignedTx {
			tx_type: 14,
			tx_info: info.as_ptr(),
			tx_hash: ptr::null(),
			message_to_sign: ptr::null(),
			err: err.as_ptr(),
		};
		assert_eq!(
			raw.into_result().unwrap_err(),
			SignerError("insufficient_margin".into())
		);
	}

	#[test]
	fn signed_tx_success_keeps_partial_fields() {
		let info = CString::new("{\"x\":1}").unwrap();
		let hash = CString::new("0xabc").unwrap();
		let raw = RawSignedTx {
			tx_type: 14,
			tx_info: info.as_ptr(),
			tx_hash: hash.as_ptr(),
			message_to_sign: ptr::null(),
			err: ptr::null(),
		};
		let tx = raw.into_result().unwrap();
		assert_eq!(tx.tx_type, 14);
		assert_eq!(tx.tx_info.as_deref(), Some("{\"x\":1}"));
		assert_eq!(tx.tx_hash.as_deref(), Some("0xabc"));
		assert_eq!(tx.message_to_sign, None);
	}

	#[test]
	fn str_or_err_variants() {
		let token = CString::new("token123").unwrap();
		let ok = RawStrOrErr {
			value: token.as_ptr(),
			err: ptr::null(),
		};
		assert_eq!(ok.into_result().unwrap().as_deref(), Some("token123"));

		let neither = RawStrOrErr {
			value: ptr::null(),
			err: ptr::null(),
		};
		assert_eq!(neither.into_result().unwrap(), None);

		let failure = CString::new("expired").unwrap();
		let failed = RawStrOrErr {
			value: ptr::null(),
			err: failure.as_ptr(),
		};
		assert_eq!(
			failed.into_result().unwrap_err(),
			SignerError("expired".into())
		);
	}

	#[test]
	fn interior_nul_in_credentials_is_a_signer_error() {
		let err = c_string("privateKey", "ab\0cd").unwrap_err();
		assert_eq!(
			err.0,
			"privateKey contains an interior nul byte"
		);
	}
}
