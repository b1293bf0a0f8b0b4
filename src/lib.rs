//! An
//! [OSCORE](https://tools.ietf.org/html/rfc8613)
//! message protection core for CoAP.
//!
//! A [`SecurityContext`] is derived from a shared master secret and the
//! sender and recipient IDs of the two endpoints. It turns CoAP messages into
//! OSCORE messages and back, keeping the sender sequence number and the
//! replay window that make every nonce unique and every request count only
//! once. Contexts can be shared between threads.
//!
//! Which context a message belongs to is decided by the stores in [`store`],
//! by server URI on the client side and by `kid` on the server side.
//!
//! Everything works on the byte representation of CoAP messages, so the
//! transport and the CoAP stack around it are up to the application.
//!
//! ## Security
//! Sender sequence numbers and replay windows are only kept in memory. A
//! context must not be recreated from the same master secret after a
//! restart, since that would reuse nonces.

mod cbor;
pub mod algorithm;
pub mod context;
pub mod error;
pub mod option;
pub mod proxy_uri;
pub mod store;
pub mod util;

#[cfg(test)]
mod test_vectors;

pub use algorithm::{AeadAlgorithm, KdfAlgorithm};
pub use context::{ContextParams, RequestBinding, SecurityContext};
pub use error::Error;
pub use store::{ContextResolver, IdContextStore, RecipientKey, UriContextStore};

/// The result type for this crate.
pub type Result<T> = core::result::Result<T, Error>;
