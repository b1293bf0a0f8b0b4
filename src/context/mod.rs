//! The security context and the message protection built on it.

use core::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use parking_lot::Mutex;
use serde::Deserialize;

use crate::{
    algorithm::{AeadAlgorithm, KdfAlgorithm},
    error::Error,
    util, Result,
};

mod protect;
mod replay;
mod unprotect;

pub use replay::ReplayWindow;

/// The replay window size used unless configured otherwise.
pub const DEFAULT_REPLAY_WINDOW_SIZE: usize = 32;
/// The largest replay window a context accepts.
pub const MAX_REPLAY_WINDOW_SIZE: usize = 1 << 16;
/// The plaintext size limit used unless configured otherwise.
///
/// Independent of this limit, a protected message must fit into the 1280
/// bytes `coap-lite` encodes at most, otherwise protection fails with
/// `MessageTooLarge` as well.
pub const DEFAULT_MAX_UNFRAGMENTED_SIZE: usize = 4096;

fn default_replay_window_size() -> usize {
    DEFAULT_REPLAY_WINDOW_SIZE
}

fn default_max_unfragmented_size() -> usize {
    DEFAULT_MAX_UNFRAGMENTED_SIZE
}

/// The parameters a security context is established from.
///
/// Everything but the master secret and the two IDs has a default, and the
/// whole thing can be deserialized, with the algorithms given as their COSE
/// identifiers.
#[derive(Clone, Deserialize)]
pub struct ContextParams {
    #[serde(with = "serde_bytes")]
    pub master_secret: Vec<u8>,
    #[serde(default, with = "serde_bytes")]
    pub master_salt: Vec<u8>,
    /// The role of the endpoint, kept for the application. Keys are
    /// assigned by sender and recipient ID alone, which already gives the
    /// two peers mirrored keys.
    #[serde(default)]
    pub is_client: bool,
    #[serde(default)]
    pub aead: AeadAlgorithm,
    #[serde(default)]
    pub kdf: KdfAlgorithm,
    #[serde(with = "serde_bytes")]
    pub sender_id: Vec<u8>,
    #[serde(with = "serde_bytes")]
    pub recipient_id: Vec<u8>,
    #[serde(default, with = "serde_bytes")]
    pub id_context: Option<Vec<u8>>,
    #[serde(default = "default_replay_window_size")]
    pub replay_window_size: usize,
    #[serde(default = "default_max_unfragmented_size")]
    pub max_unfragmented_size: usize,
}

impl ContextParams {
    /// Creates parameters with the defaults for everything optional.
    pub fn new(
        master_secret: Vec<u8>,
        sender_id: Vec<u8>,
        recipient_id: Vec<u8>,
    ) -> ContextParams {
        ContextParams {
            master_secret,
            master_salt: Vec::new(),
            is_client: false,
            aead: AeadAlgorithm::default(),
            kdf: KdfAlgorithm::default(),
            sender_id,
            recipient_id,
            id_context: None,
            replay_window_size: DEFAULT_REPLAY_WINDOW_SIZE,
            max_unfragmented_size: DEFAULT_MAX_UNFRAGMENTED_SIZE,
        }
    }

    pub fn master_salt(mut self, master_salt: Vec<u8>) -> ContextParams {
        self.master_salt = master_salt;
        self
    }

    /// Records the endpoint role. It doesn't change the derived keys.
    pub fn client(mut self, is_client: bool) -> ContextParams {
        self.is_client = is_client;
        self
    }

    pub fn aead(mut self, aead: AeadAlgorithm) -> ContextParams {
        self.aead = aead;
        self
    }

    pub fn kdf(mut self, kdf: KdfAlgorithm) -> ContextParams {
        self.kdf = kdf;
        self
    }

    pub fn id_context(mut self, id_context: Option<Vec<u8>>) -> ContextParams {
        self.id_context = id_context;
        self
    }

    pub fn replay_window_size(mut self, size: usize) -> ContextParams {
        self.replay_window_size = size;
        self
    }

    pub fn max_unfragmented_size(mut self, size: usize) -> ContextParams {
        self.max_unfragmented_size = size;
        self
    }

    /// Checks the parameters that the derivation itself doesn't reject.
    fn validate(&self) -> Result<()> {
        if self.master_secret.is_empty() {
            return Err(Error::InvalidParameters("empty master secret"));
        }
        if self.sender_id == self.recipient_id {
            return Err(Error::InvalidParameters(
                "sender ID equals recipient ID",
            ));
        }
        if self.replay_window_size == 0 {
            return Err(Error::InvalidParameters("replay window size is 0"));
        }
        if self.replay_window_size > MAX_REPLAY_WINDOW_SIZE {
            return Err(Error::InvalidParameters("replay window too large"));
        }
        let max_id_len = self.aead.max_id_len();
        if self.sender_id.len() > max_id_len
            || self.recipient_id.len() > max_id_len
        {
            return Err(Error::InvalidParameters("ID too long for the AEAD"));
        }

        Ok(())
    }
}

impl fmt::Debug for ContextParams {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ContextParams")
            .field("is_client", &self.is_client)
            .field("aead", &self.aead)
            .field("kdf", &self.kdf)
            .field("sender_id", &self.sender_id)
            .field("recipient_id", &self.recipient_id)
            .field("id_context", &self.id_context)
            .field("replay_window_size", &self.replay_window_size)
            .field("max_unfragmented_size", &self.max_unfragmented_size)
            .finish()
    }
}

/// The `kid` and `piv` of a request, which its response is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBinding {
    kid: Vec<u8>,
    piv: Vec<u8>,
}

impl RequestBinding {
    /// Returns the key ID of the request, the requester's sender ID.
    pub fn kid(&self) -> &[u8] {
        &self.kid
    }

    /// Returns the Partial IV of the request.
    pub fn piv(&self) -> &[u8] {
        &self.piv
    }

    /// Returns the sequence number the Partial IV encodes.
    pub fn sequence_number(&self) -> u64 {
        util::piv_to_u64(&self.piv)
    }
}

/// The common context part of the security context.
struct CommonContext {
    master_secret: Vec<u8>,
    master_salt: Vec<u8>,
    aead: AeadAlgorithm,
    kdf: KdfAlgorithm,
    id_context: Option<Vec<u8>>,
    common_iv: Vec<u8>,
    max_unfragmented_size: usize,
}

/// The sender context part of the security context.
struct SenderContext {
    sender_id: Vec<u8>,
    sender_key: Vec<u8>,
    // The next number to use, past the maximum once exhausted
    sender_sequence_number: AtomicU64,
}

/// The recipient context part of the security context.
struct RecipientContext {
    recipient_id: Vec<u8>,
    recipient_key: Vec<u8>,
    replay_window: Mutex<ReplayWindow>,
}

/// The security context.
///
/// All operations take `&self`, so a context can be shared between threads
/// behind an `Arc`. The sender sequence number is advanced atomically and
/// the replay window is only touched under its lock.
pub struct SecurityContext {
    is_client: bool,
    common_context: CommonContext,
    sender_context: SenderContext,
    recipient_context: RecipientContext,
}

impl SecurityContext {
    /// Creates a new `SecurityContext`, deriving its keys and IV.
    pub fn new(params: ContextParams) -> Result<SecurityContext> {
        params.validate()?;
        let ContextParams {
            master_secret,
            master_salt,
            is_client,
            aead,
            kdf,
            sender_id,
            recipient_id,
            id_context,
            replay_window_size,
            max_unfragmented_size,
        } = params;

        let derive = |id: &[u8], r#type: &str, l: usize| -> Result<Vec<u8>> {
            let info =
                util::build_info(id, id_context.as_deref(), aead, r#type, l)?;
            kdf.derive(&master_secret, &master_salt, &info, l)
        };
        let sender_key = derive(&sender_id, "Key", aead.key_len())?;
        let recipient_key = derive(&recipient_id, "Key", aead.key_len())?;
        let common_iv = derive(&[], "IV", aead.nonce_len())?;

        tracing::debug!(
            sender_id = ?sender_id,
            recipient_id = ?recipient_id,
            is_client,
            aead = aead.id(),
            "Derived security context"
        );

        Ok(SecurityContext {
            is_client,
            common_context: CommonContext {
                master_secret,
                master_salt,
                aead,
                kdf,
                id_context,
                common_iv,
                max_unfragmented_size,
            },
            sender_context: SenderContext {
                sender_id,
                sender_key,
                sender_sequence_number: AtomicU64::new(0),
            },
            recipient_context: RecipientContext {
                recipient_id,
                recipient_key,
                replay_window: Mutex::new(ReplayWindow::new(
                    replay_window_size,
                )),
            },
        })
    }

    /// Returns whether this context was created for the client side.
    pub fn is_client(&self) -> bool {
        self.is_client
    }

    pub fn sender_id(&self) -> &[u8] {
        &self.sender_context.sender_id
    }

    pub fn recipient_id(&self) -> &[u8] {
        &self.recipient_context.recipient_id
    }

    pub fn id_context(&self) -> Option<&[u8]> {
        self.common_context.id_context.as_deref()
    }

    pub fn aead(&self) -> AeadAlgorithm {
        self.common_context.aead
    }

    pub fn kdf(&self) -> KdfAlgorithm {
        self.common_context.kdf
    }

    pub fn master_secret(&self) -> &[u8] {
        &self.common_context.master_secret
    }

    pub fn master_salt(&self) -> &[u8] {
        &self.common_context.master_salt
    }

    pub fn max_unfragmented_size(&self) -> usize {
        self.common_context.max_unfragmented_size
    }

    /// Returns the sequence number the next protected message will use.
    pub fn sender_sequence_number(&self) -> u64 {
        self.sender_context
            .sender_sequence_number
            .load(Ordering::SeqCst)
    }

    /// Returns whether the sender sequence number space is used up.
    ///
    /// An exhausted context is done for. Protecting and unprotecting both
    /// fail with `ContextExhausted` from then on.
    pub fn is_exhausted(&self) -> bool {
        self.sender_sequence_number() > util::MAX_SEQUENCE_NUMBER
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.is_exhausted() {
            return Err(Error::ContextExhausted);
        }

        Ok(())
    }

    /// Returns the highest sequence number accepted from the peer.
    pub fn highest_received(&self) -> Option<u64> {
        self.recipient_context.replay_window.lock().highest()
    }

    /// Takes the next sender sequence number, formatted as Partial IV.
    ///
    /// The counter is advanced with a compare-and-swap loop so concurrent
    /// callers always get distinct numbers.
    fn next_piv(&self) -> Result<Vec<u8>> {
        let taken = self
            .sender_context
            .sender_sequence_number
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n > util::MAX_SEQUENCE_NUMBER {
                    None
                } else {
                    Some(n + 1)
                }
            })
            .map_err(|_| Error::ContextExhausted)?;

        Ok(util::format_piv(taken))
    }

    #[cfg(test)]
    pub(crate) fn set_sender_sequence_number(&self, n: u64) {
        self.sender_context
            .sender_sequence_number
            .store(n, Ordering::SeqCst);
    }
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SecurityContext")
            .field("is_client", &self.is_client)
            .field("sender_id", &self.sender_context.sender_id)
            .field("recipient_id", &self.recipient_context.recipient_id)
            .field("id_context", &self.common_context.id_context)
            .field("aead", &self.common_context.aead)
            .field("sender_sequence_number", &self.sender_sequence_number())
            .finish()
    }
}
