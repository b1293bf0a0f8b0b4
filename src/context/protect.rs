use coap_lite::{
    error::MessageError, CoapOption, MessageClass, Packet, RequestType,
    ResponseType,
};
use core::{convert::TryFrom, mem};
use std::collections::LinkedList;

use super::{RequestBinding, SecurityContext};
use crate::{
    error::Error, option::OscoreOption, proxy_uri::ProxyUri, util, Result,
};

/// The known class U options that have to remain public.
pub(super) static CLASS_U: [CoapOption; 4] = [
    CoapOption::UriHost,
    CoapOption::UriPort,
    CoapOption::ProxyUri,
    CoapOption::ProxyScheme,
];
/// The optional options that we don't support.
pub(super) static UNSUPPORTED: [CoapOption; 6] = [
    CoapOption::Observe,
    CoapOption::Block2,
    CoapOption::Block1,
    CoapOption::Size2,
    CoapOption::Size1,
    CoapOption::NoResponse,
];

impl SecurityContext {
    /// Returns an OSCORE message based on the original CoAP request, along
    /// with the binding needed to handle its response.
    ///
    /// A sequence number is only taken once the message is known to fit.
    ///
    /// # Arguments
    /// * `coap_msg` - The original CoAP request to protect.
    pub fn protect_request(
        &self,
        coap_msg: &[u8],
    ) -> Result<(Vec<u8>, RequestBinding)> {
        self.ensure_usable()?;
        let original = self.parse_plaintext(coap_msg)?;
        let kid = self.sender_context.sender_id.clone();
        // Requests always carry kid and piv, plus the kid context if we
        // have one
        let mut option = OscoreOption {
            piv: Some(util::format_piv(util::MAX_SEQUENCE_NUMBER)),
            kid_context: self.common_context.id_context.clone(),
            kid: Some(kid.clone()),
        };
        let (outer, plaintext) = split_message(original)?;
        self.check_size(&outer, &option, plaintext.len())?;

        let piv = self.next_piv()?;
        option.piv = Some(piv.clone());
        let aad = util::build_aad(self.aead(), &kid, &piv)?;
        // Requests are always protected with our own sender ID and PIV
        let nonce =
            util::compute_nonce(&piv, &kid, &self.common_context.common_iv);

        tracing::trace!(kid = ?kid, piv = ?piv, "Protecting request");
        let protected =
            self.seal_message(outer, &plaintext, &aad, &nonce, &option)?;

        Ok((protected, RequestBinding { kid, piv }))
    }

    /// Returns an OSCORE message based on the original CoAP response.
    ///
    /// # Arguments
    /// * `coap_msg` - The original CoAP response to protect.
    /// * `request` - The binding of the request to which to respond.
    /// * `reuse_piv` - Whether the request's `piv` should be reused. Otherwise
    ///   the own `sender_sequence_number` will be used.
    pub fn protect_response(
        &self,
        coap_msg: &[u8],
        request: &RequestBinding,
        reuse_piv: bool,
    ) -> Result<Vec<u8>> {
        self.ensure_usable()?;
        let original = self.parse_plaintext(coap_msg)?;
        let (outer, plaintext) = split_message(original)?;
        let aad = util::build_aad(self.aead(), request.kid(), request.piv())?;

        let (nonce, option) = if reuse_piv {
            // Same nonce as the request, empty OSCORE option
            let option = OscoreOption::default();
            self.check_size(&outer, &option, plaintext.len())?;
            (
                util::compute_nonce(
                    request.piv(),
                    request.kid(),
                    &self.common_context.common_iv,
                ),
                option,
            )
        } else {
            // Fresh nonce from own sender context, transmit piv but no kid
            let longest = OscoreOption {
                piv: Some(util::format_piv(util::MAX_SEQUENCE_NUMBER)),
                ..OscoreOption::default()
            };
            self.check_size(&outer, &longest, plaintext.len())?;
            let piv = self.next_piv()?;
            (
                util::compute_nonce(
                    &piv,
                    &self.sender_context.sender_id,
                    &self.common_context.common_iv,
                ),
                OscoreOption {
                    piv: Some(piv),
                    ..OscoreOption::default()
                },
            )
        };

        self.seal_message(outer, &plaintext, &aad, &nonce, &option)
    }

    /// Parses the plaintext after checking it against the size limit.
    fn parse_plaintext(&self, coap_msg: &[u8]) -> Result<Packet> {
        if coap_msg.len() > self.common_context.max_unfragmented_size {
            return Err(Error::MessageTooLarge);
        }

        Ok(Packet::from_bytes(coap_msg)?)
    }

    /// Fails with `MessageTooLarge` unless the protected message, with an
    /// OSCORE option no shorter than `option`, can be encoded.
    fn check_size(
        &self,
        outer: &Packet,
        option: &OscoreOption,
        plaintext_len: usize,
    ) -> Result<()> {
        let mut protected = outer.clone();
        protected.add_option(CoapOption::Oscore, option.encode());
        protected.payload = vec![0; plaintext_len + self.aead().tag_len()];

        encode(&protected).map(|_| ())
    }

    /// Encrypts the plaintext into the outer message and returns its bytes.
    ///
    /// # Arguments
    /// * `outer` - The outer message, holding the class U options.
    /// * `plaintext` - The code, class E options and payload.
    /// * `aad` - The AAD for the AEAD.
    /// * `nonce` - The AEAD nonce to use.
    /// * `option` - The content of the OSCORE option.
    fn seal_message(
        &self,
        mut outer: Packet,
        plaintext: &[u8],
        aad: &[u8],
        nonce: &[u8],
        option: &OscoreOption,
    ) -> Result<Vec<u8>> {
        outer.payload = self.aead().seal(
            &self.sender_context.sender_key,
            nonce,
            aad,
            plaintext,
        )?;
        outer.add_option(CoapOption::Oscore, option.encode());

        encode(&outer)
    }
}

/// Splits the original message into the outer message and the plaintext
/// that gets encrypted into it.
fn split_message(mut original: Packet) -> Result<(Packet, Vec<u8>)> {
    // An OSCORE option in the plaintext only marks the message for
    // protection, the real one is added at the end
    original.clear_option(CoapOption::Oscore);

    // The inner message carries everything that gets encrypted, starting
    // with the real code
    let mut inner = Packet::new();
    inner.header.code = original.header.code;
    original.header.code = match original.header.code {
        MessageClass::Response(_) => {
            MessageClass::Response(ResponseType::Changed)
        }
        // Requests, and whatever else the code might be
        _ => MessageClass::Request(RequestType::Post),
    };

    if let Some(proxy_uri) = original.get_option(CoapOption::ProxyUri) {
        let proxy_uri = proxy_uri.front().ok_or(Error::InvalidProxyUri)?;
        let proxy_uri = ProxyUri::try_from(proxy_uri.as_slice())?;

        // Path and query get protected with the other class E options
        if let Some(path_list) = proxy_uri.get_path_list() {
            original.set_option(CoapOption::UriPath, path_list);
        }
        if let Some(query_list) = proxy_uri.get_query_list() {
            original.set_option(CoapOption::UriQuery, query_list);
        }

        // The rest remains public for the proxy
        let mut uri_list = LinkedList::new();
        uri_list.push_back(proxy_uri.compose_proxy_uri());
        original.set_option(CoapOption::ProxyUri, uri_list);
    }

    // Anything not known to be class U is class E
    let mut moved_options = vec![];
    for (number, value_list) in original.options() {
        let option = CoapOption::from(*number);

        if UNSUPPORTED.contains(&option) {
            return Err(Error::UnsupportedOption(option));
        }
        if CLASS_U.contains(&option) {
            continue;
        }

        // Class E or undefined, so protect it
        inner.set_option(option, value_list.clone());
        moved_options.push(option);
    }
    for option in moved_options {
        original.clear_option(option);
    }

    inner.payload = mem::take(&mut original.payload);
    // The plaintext is the code, the options and the payload
    let mut plaintext = encode(&inner)?;
    // Keep the code byte, drop version/type/tkl, message ID and token
    let tkl = inner.header.get_token_length() as usize;
    plaintext.drain(2..4 + tkl);
    plaintext.remove(0);

    Ok((original, plaintext))
}

/// Returns the bytes of `packet`, with a length `coap-lite` refuses to
/// encode reported as `MessageTooLarge`.
fn encode(packet: &Packet) -> Result<Vec<u8>> {
    packet.to_bytes().map_err(|e| match e {
        MessageError::InvalidPacketLength => Error::MessageTooLarge,
        e => Error::Coap(e),
    })
}
