//! CBOR encoding of the structures that go into key derivation and the AAD.
//!
//! Tuples become CBOR arrays, `serde_bytes` wrappers byte strings and `None`
//! or `()` the simple value `null`, which is all these structures need.

use core::fmt;
use serde::Serialize;
use std::error;

/// A structure that `serde_cbor` refused to encode.
#[derive(Debug)]
pub struct CborError(serde_cbor::Error);

impl From<serde_cbor::Error> for CborError {
    fn from(e: serde_cbor::Error) -> CborError {
        CborError(e)
    }
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CBOR encoding failed: {}", self.0)
    }
}

impl error::Error for CborError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Serializes an object into CBOR.
pub fn encode(object: impl Serialize) -> Result<Vec<u8>, CborError> {
    Ok(serde_cbor::to_vec(&object)?)
}
