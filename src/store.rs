//! Registries of security contexts, for finding the one a message belongs
//! to.
//!
//! A client picks the context for an outgoing request by the URI it's sent
//! to, a server picks the context for an incoming request by the `kid` (and
//! kid context) in its OSCORE option.

use coap_lite::Packet;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

use crate::{
    context::{RequestBinding, SecurityContext},
    error::Error,
    option::OscoreOption,
    Result,
};

/// Something that can find the security context for a key.
pub trait ContextResolver {
    /// What contexts are looked up by.
    type Key: ?Sized;

    /// Returns the context responsible for `key`, or
    /// [`Error::UnknownContext`] if there is none.
    fn resolve(&self, key: &Self::Key) -> Result<Arc<SecurityContext>>;
}

/// Security contexts registered under the URI of the server they're used
/// with.
#[derive(Debug, Default)]
pub struct UriContextStore {
    contexts: RwLock<HashMap<String, Arc<SecurityContext>>>,
}

impl UriContextStore {
    pub fn new() -> UriContextStore {
        UriContextStore::default()
    }

    /// Registers `context` for `uri` and everything below it, returning the
    /// context previously registered for exactly this URI.
    pub fn add_context(
        &self,
        uri: &str,
        context: Arc<SecurityContext>,
    ) -> Option<Arc<SecurityContext>> {
        tracing::debug!(
            uri,
            sender_id = ?context.sender_id(),
            "Adding context"
        );
        self.contexts.write().insert(uri.to_string(), context)
    }

    /// Returns the context registered for exactly `uri`.
    pub fn lookup(&self, uri: &str) -> Option<Arc<SecurityContext>> {
        self.contexts.read().get(uri).cloned()
    }

    pub fn remove_context(&self, uri: &str) -> Option<Arc<SecurityContext>> {
        self.contexts.write().remove(uri)
    }

    /// Protects a request to `uri` with the context responsible for it.
    pub fn protect_request(
        &self,
        uri: &str,
        coap_msg: &[u8],
    ) -> Result<(Arc<SecurityContext>, Vec<u8>, RequestBinding)> {
        let context = self.resolve(uri)?;
        let (protected, binding) = context.protect_request(coap_msg)?;

        Ok((context, protected, binding))
    }
}

/// Returns whether `prefix` is `uri` itself or ends where a path segment or
/// the query of `uri` starts.
fn is_uri_prefix(prefix: &str, uri: &str) -> bool {
    if !uri.starts_with(prefix) {
        return false;
    }
    let rest = &uri[prefix.len()..];
    prefix.ends_with('/')
        || rest.is_empty()
        || rest.starts_with('/')
        || rest.starts_with('?')
}

impl ContextResolver for UriContextStore {
    type Key = str;

    /// Returns the context registered for the longest prefix of `uri`.
    fn resolve(&self, uri: &str) -> Result<Arc<SecurityContext>> {
        let contexts = self.contexts.read();
        let found = contexts
            .iter()
            .filter(|(prefix, _)| is_uri_prefix(prefix, uri))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, context)| Arc::clone(context));

        found.ok_or_else(|| {
            tracing::debug!(uri, "No context for URI");
            Error::UnknownContext
        })
    }
}

/// What a server tells its peers' contexts apart by: the peer's sender ID,
/// which is our recipient ID, and the ID Context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecipientKey {
    pub kid: Vec<u8>,
    pub id_context: Option<Vec<u8>>,
}

impl RecipientKey {
    pub fn new(kid: Vec<u8>, id_context: Option<Vec<u8>>) -> RecipientKey {
        RecipientKey { kid, id_context }
    }
}

impl From<&SecurityContext> for RecipientKey {
    fn from(context: &SecurityContext) -> RecipientKey {
        RecipientKey {
            kid: context.recipient_id().to_vec(),
            id_context: context.id_context().map(<[u8]>::to_vec),
        }
    }
}

/// Security contexts registered under the `kid` and kid context requests
/// protected with them carry.
#[derive(Debug, Default)]
pub struct IdContextStore {
    contexts: RwLock<HashMap<RecipientKey, Arc<SecurityContext>>>,
}

impl IdContextStore {
    pub fn new() -> IdContextStore {
        IdContextStore::default()
    }

    /// Registers `context` under its recipient ID and ID Context, returning
    /// the context previously registered under them.
    pub fn add_context(
        &self,
        context: Arc<SecurityContext>,
    ) -> Option<Arc<SecurityContext>> {
        let key = RecipientKey::from(context.as_ref());
        tracing::debug!(key = ?key, "Adding context");
        self.contexts.write().insert(key, context)
    }

    pub fn lookup(&self, key: &RecipientKey) -> Option<Arc<SecurityContext>> {
        self.contexts.read().get(key).cloned()
    }

    pub fn remove_context(
        &self,
        key: &RecipientKey,
    ) -> Option<Arc<SecurityContext>> {
        self.contexts.write().remove(key)
    }

    /// Unprotects an incoming request with the context its OSCORE option
    /// points to.
    ///
    /// Returns the context, so the response can be protected with it, along
    /// with the CoAP request and its binding.
    pub fn unprotect_request(
        &self,
        oscore_msg: &[u8],
    ) -> Result<(Arc<SecurityContext>, Vec<u8>, RequestBinding)> {
        let packet = Packet::from_bytes(oscore_msg)?;
        let option = OscoreOption::from_packet(&packet)?;
        let kid = option.kid.clone().ok_or(Error::NoKidPiv)?;

        let context =
            self.resolve(&RecipientKey::new(kid, option.kid_context.clone()))?;
        let (request, binding) = context.open_request(packet, option)?;

        Ok((context, request, binding))
    }
}

impl ContextResolver for IdContextStore {
    type Key = RecipientKey;

    fn resolve(&self, key: &RecipientKey) -> Result<Arc<SecurityContext>> {
        self.lookup(key).ok_or_else(|| {
            tracing::debug!(key = ?key, "No context for kid");
            Error::UnknownContext
        })
    }
}
