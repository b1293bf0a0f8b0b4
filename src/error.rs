//! The errors of the crate.

use coap_lite::{error as coap, CoapOption, ResponseType};
use core::fmt;
use std::error;

use crate::cbor;

/// The catch-all error type for this crate.
///
/// The first group of variants is the outcome of the protection rules
/// themselves, the rest either describe malformed input or wrap errors from
/// the libraries used underneath.
#[derive(Debug)]
pub enum Error {
    /// The parameters for a security context are unusable.
    InvalidParameters(&'static str),
    /// The plaintext message is larger than the context allows.
    MessageTooLarge,
    /// The sender sequence number space of the context is used up.
    ContextExhausted,
    /// No security context is registered for the key or key identifier.
    UnknownContext,
    /// This message has been received already, or is too old.
    ReplayDetected,
    /// The AEAD rejected the ciphertext.
    AuthenticationFailed,
    /// CoAP message doesn't contain OSCORE option.
    NoOscoreOption,
    /// CoAP request doesn't have kid or piv.
    NoKidPiv,
    /// The OSCORE option value can't be decoded.
    MalformedOption,
    /// Error while parsing Proxy-Uri.
    InvalidProxyUri,
    /// Message contains an unsupported option.
    UnsupportedOption(CoapOption),
    /// The COSE algorithm identifier isn't supported.
    UnsupportedAlgorithm(i32),
    /// Wraps errors from the `cbor` module.
    Cbor(cbor::CborError),
    /// Wraps errors from `hkdf`.
    Hkdf(hkdf::InvalidLength),
    /// Error in `ccm` while encrypting.
    Aead,
    /// Wraps errors from `coap_lite`.
    Coap(coap::MessageError),
}

impl Error {
    /// Returns the code of the CoAP error response a server should answer
    /// with, if any.
    ///
    /// Replays, failed verification and unknown contexts share one code and
    /// carry no diagnostic payload, so a peer can't tell them apart.
    pub fn response_code(&self) -> Option<ResponseType> {
        match self {
            Error::UnknownContext
            | Error::ReplayDetected
            | Error::AuthenticationFailed => Some(ResponseType::Unauthorized),
            Error::NoOscoreOption
            | Error::NoKidPiv
            | Error::InvalidProxyUri
            | Error::Coap(_) => Some(ResponseType::BadRequest),
            Error::MalformedOption | Error::UnsupportedOption(_) => {
                Some(ResponseType::BadOption)
            }
            Error::MessageTooLarge => {
                Some(ResponseType::RequestEntityTooLarge)
            }
            Error::InvalidParameters(_)
            | Error::ContextExhausted
            | Error::UnsupportedAlgorithm(_)
            | Error::Cbor(_)
            | Error::Hkdf(_)
            | Error::Aead => Some(ResponseType::InternalServerError),
        }
    }
}

impl From<cbor::CborError> for Error {
    fn from(e: cbor::CborError) -> Error {
        Error::Cbor(e)
    }
}

impl From<hkdf::InvalidLength> for Error {
    fn from(e: hkdf::InvalidLength) -> Error {
        Error::Hkdf(e)
    }
}

impl From<coap::MessageError> for Error {
    fn from(e: coap::MessageError) -> Error {
        Error::Coap(e)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Error {
        Error::InvalidProxyUri
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidParameters(reason) => {
                write!(f, "Invalid security context parameters: {}", reason)
            }
            Error::MessageTooLarge => {
                write!(f, "Message exceeds the maximum unfragmented size")
            }
            Error::ContextExhausted => {
                write!(f, "Sender sequence number space is exhausted")
            }
            Error::UnknownContext => write!(f, "Security context not found"),
            Error::ReplayDetected => {
                write!(f, "This message has been received already")
            }
            Error::AuthenticationFailed => write!(f, "Decryption failed"),
            Error::NoOscoreOption => {
                write!(f, "CoAP message doesn't contain OSCORE option")
            }
            Error::NoKidPiv => {
                write!(f, "CoAP request doesn't have kid or piv")
            }
            Error::MalformedOption => write!(f, "Malformed OSCORE option"),
            Error::InvalidProxyUri => {
                write!(f, "Error while parsing Proxy-Uri")
            }
            Error::UnsupportedOption(o) => {
                write!(f, "Message contains an unsupported option: {:?}", o)
            }
            Error::UnsupportedAlgorithm(id) => {
                write!(f, "Unsupported COSE algorithm: {}", id)
            }
            Error::Cbor(e) => e.fmt(f),
            Error::Hkdf(e) => write!(f, "HKDF error: {:?}", e),
            Error::Aead => write!(f, "Error using AEAD"),
            Error::Coap(e) => write!(f, "CoAP error: {:?}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Cbor(e) => Some(e),
            // Other errors either have no cause or wrap library types whose
            // std support depends on their features
            _ => None,
        }
    }
}
