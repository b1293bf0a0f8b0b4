use coap_lite::{error::MessageError, CoapOption, Packet};

use super::{
    protect::{CLASS_U, UNSUPPORTED},
    RequestBinding, SecurityContext,
};
use crate::{error::Error, option::OscoreOption, util, Result};

impl SecurityContext {
    /// Returns the original CoAP request protected in the OSCORE message,
    /// along with the binding needed to protect its response.
    ///
    /// # Arguments
    /// * `oscore_msg` - The OSCORE message protecting the CoAP request.
    pub fn unprotect_request(
        &self,
        oscore_msg: &[u8],
    ) -> Result<(Vec<u8>, RequestBinding)> {
        let original = Packet::from_bytes(oscore_msg)?;
        let option = OscoreOption::from_packet(&original)?;

        self.open_request(original, option)
    }

    /// Unprotects a parsed request whose OSCORE option was already decoded.
    pub(crate) fn open_request(
        &self,
        mut original: Packet,
        option: OscoreOption,
    ) -> Result<(Vec<u8>, RequestBinding)> {
        self.ensure_usable()?;
        // Requests always name their sender and sequence number
        let (kid, piv) = match (option.kid, option.piv) {
            (Some(kid), Some(piv)) => (kid, piv),
            _ => return Err(Error::NoKidPiv),
        };
        if kid != self.recipient_context.recipient_id {
            return Err(Error::UnknownContext);
        }
        if let Some(kid_context) = option.kid_context {
            if Some(kid_context.as_slice()) != self.id_context() {
                return Err(Error::UnknownContext);
            }
        }

        let aad = util::build_aad(self.aead(), &kid, &piv)?;
        let nonce =
            util::compute_nonce(&piv, &kid, &self.common_context.common_iv);
        let plaintext = self.decrypt_payload(&mut original, &aad, &nonce)?;

        // Only an authentic message may move the window, and checking and
        // marking happen under one lock so a concurrent duplicate can't pass
        let seq = util::piv_to_u64(&piv);
        if let Err(e) =
            self.recipient_context.replay_window.lock().check_and_mark(seq)
        {
            tracing::debug!(kid = ?kid, seq, "Rejecting replayed request");
            return Err(e);
        }

        let request = restore_message(original, &plaintext)?;
        Ok((request, RequestBinding { kid, piv }))
    }

    /// Returns the original CoAP response protected in the OSCORE message.
    ///
    /// # Arguments
    /// * `oscore_msg` - The OSCORE message protecting the CoAP response.
    /// * `request` - The binding of the request this is the response to.
    pub fn unprotect_response(
        &self,
        oscore_msg: &[u8],
        request: &RequestBinding,
    ) -> Result<Vec<u8>> {
        self.ensure_usable()?;
        let mut original = Packet::from_bytes(oscore_msg)?;
        let option = OscoreOption::from_packet(&original)?;

        let nonce = match option.piv {
            // The server used its own sender context
            Some(piv) => util::compute_nonce(
                &piv,
                &self.recipient_context.recipient_id,
                &self.common_context.common_iv,
            ),
            // The server reused the request's nonce
            None => util::compute_nonce(
                request.piv(),
                request.kid(),
                &self.common_context.common_iv,
            ),
        };
        let aad = util::build_aad(self.aead(), request.kid(), request.piv())?;
        let plaintext = self.decrypt_payload(&mut original, &aad, &nonce)?;

        restore_message(original, &plaintext)
    }

    /// Strips the class E options from the outer message and returns the
    /// decrypted payload.
    ///
    /// # Arguments
    /// * `original` - The OSCORE message.
    /// * `aad` - The AAD for the AEAD.
    /// * `nonce` - The AEAD nonce to use.
    fn decrypt_payload(
        &self,
        original: &mut Packet,
        aad: &[u8],
        nonce: &[u8],
    ) -> Result<Vec<u8>> {
        // The outer class E options are only copies, if anything
        let mut to_discard = vec![];
        for (number, _) in original.options() {
            let option = CoapOption::from(*number);

            if UNSUPPORTED.contains(&option) {
                return Err(Error::UnsupportedOption(option));
            }
            if CLASS_U.contains(&option) {
                continue;
            }

            // Class E, undefined or the OSCORE option itself
            to_discard.push(option);
        }
        for option in to_discard {
            original.clear_option(option);
        }

        let plaintext = self.aead().open(
            &self.recipient_context.recipient_key,
            nonce,
            aad,
            &original.payload,
        );
        if plaintext.is_err() {
            tracing::debug!(
                recipient_id = ?self.recipient_context.recipient_id,
                "Rejecting message that failed verification"
            );
        }

        plaintext
    }
}

/// Puts the code, options and payload of the decrypted inner message into
/// the outer one and returns its bytes.
fn restore_message(mut original: Packet, plaintext: &[u8]) -> Result<Vec<u8>> {
    let (&code, rest) = plaintext
        .split_first()
        .ok_or(Error::Coap(MessageError::InvalidPacketLength))?;
    // The plaintext lacks the first header byte, message ID and token, so
    // put in a version 1 CON header without token to parse it
    let mut inner = vec![0x40, code, 0x00, 0x00];
    inner.extend_from_slice(rest);
    let inner = Packet::from_bytes(&inner)?;

    original.header.code = inner.header.code;
    for (number, value_list) in inner.options() {
        original.set_option(CoapOption::from(*number), value_list.clone());
    }
    original.payload = inner.payload;

    Ok(original.to_bytes()?)
}

#[cfg(test)]
mod tests {
    use std::collections::LinkedList;

    use super::*;
    use crate::{context::ContextParams, test_vectors::*};

    fn context(sender_id: &[u8], recipient_id: &[u8]) -> SecurityContext {
        SecurityContext::new(
            ContextParams::new(
                MASTER_SECRET.to_vec(),
                sender_id.to_vec(),
                recipient_id.to_vec(),
            )
            .master_salt(MASTER_SALT.to_vec()),
        )
        .unwrap()
    }

    #[test]
    fn unprotection() {
        let req_security_context = context(&SERVER_ID, &CLIENT_ID);
        let (request, binding) = req_security_context
            .unprotect_request(&REQ_PROTECTED)
            .unwrap();
        assert_eq!(&REQ_UNPROTECTED[..], &request[..]);
        assert_eq!(&CLIENT_ID[..], binding.kid());
        assert_eq!(&REQ_PIV[..], binding.piv());
        assert_eq!(REQ_SSN, binding.sequence_number());
        assert_eq!(Some(REQ_SSN), req_security_context.highest_received());

        let res_security_context = context(&CLIENT_ID, &SERVER_ID);
        assert_eq!(
            &RES_UNPROTECTED[..],
            &res_security_context
                .unprotect_response(&RES_PROTECTED, &binding)
                .unwrap()[..]
        );
        assert_eq!(
            &RES_UNPROTECTED[..],
            &res_security_context
                .unprotect_response(&RES_PIV_PROTECTED, &binding)
                .unwrap()[..]
        );
    }

    #[test]
    fn replay() {
        let req_security_context = context(&SERVER_ID, &CLIENT_ID);

        assert!(req_security_context
            .unprotect_request(&REQ_PROTECTED)
            .is_ok());
        assert!(matches!(
            req_security_context.unprotect_request(&REQ_PROTECTED),
            Err(Error::ReplayDetected)
        ));
    }

    #[test]
    fn tampering() {
        let req_security_context = context(&SERVER_ID, &CLIENT_ID);
        // The last byte is part of the tag
        let mut tampered = REQ_PROTECTED.to_vec();
        *tampered.last_mut().unwrap() ^= 0x01;

        assert!(matches!(
            req_security_context.unprotect_request(&tampered),
            Err(Error::AuthenticationFailed)
        ));
        // The failed attempt didn't burn the sequence number
        assert_eq!(None, req_security_context.highest_received());
        assert!(req_security_context
            .unprotect_request(&REQ_PROTECTED)
            .is_ok());
    }

    #[test]
    fn exhausted() {
        let server = context(&SERVER_ID, &CLIENT_ID);
        server.set_sender_sequence_number(util::MAX_SEQUENCE_NUMBER);
        assert!(server.protect_request(&REQ_UNPROTECTED).is_ok());
        assert!(server.is_exhausted());

        // The request is authentic, but the context is finished
        assert!(matches!(
            server.unprotect_request(&REQ_PROTECTED),
            Err(Error::ContextExhausted)
        ));
        assert_eq!(None, server.highest_received());

        let client = context(&CLIENT_ID, &SERVER_ID);
        client.set_sender_sequence_number(util::MAX_SEQUENCE_NUMBER + 1);
        let binding = RequestBinding {
            kid: CLIENT_ID.to_vec(),
            piv: REQ_PIV.to_vec(),
        };
        assert!(matches!(
            client.unprotect_response(&RES_PROTECTED, &binding),
            Err(Error::ContextExhausted)
        ));
    }

    #[test]
    fn wrong_kid() {
        let other = context(&SERVER_ID, &[0x07]);
        assert!(matches!(
            other.unprotect_request(&REQ_PROTECTED),
            Err(Error::UnknownContext)
        ));
    }

    #[test]
    fn missing_kid_piv() {
        let ctx = context(&SERVER_ID, &CLIENT_ID);
        // A response-style message has no kid
        assert!(matches!(
            ctx.unprotect_request(&RES_PIV_PROTECTED),
            Err(Error::NoKidPiv)
        ));
        assert!(matches!(
            ctx.unprotect_request(&REQ_UNPROTECTED),
            Err(Error::NoOscoreOption)
        ));
    }

    #[test]
    fn proxying() {
        let req_ctx = context(&CLIENT_ID, &SERVER_ID);
        let res_ctx = context(&SERVER_ID, &CLIENT_ID);

        let mut packet = Packet::new();
        packet.add_option(
            CoapOption::ProxyUri,
            b"coap://example.com:9999/path/to/resource?q=1&p=2".to_vec(),
        );
        let (protected_bytes, _) =
            req_ctx.protect_request(&packet.to_bytes().unwrap()).unwrap();
        let protected_coap = Packet::from_bytes(&protected_bytes).unwrap();
        // The only unprotected options are the OSCORE option and the new
        // Proxy-Uri
        assert_eq!(2, protected_coap.options().len());
        assert_eq!(
            b"coap://example.com:9999",
            &protected_coap
                .get_option(CoapOption::ProxyUri)
                .unwrap()
                .front()
                .unwrap()[..]
        );

        let (unprotected_bytes, _) =
            res_ctx.unprotect_request(&protected_bytes).unwrap();
        let unprotected_coap = Packet::from_bytes(&unprotected_bytes).unwrap();
        let uri_path: LinkedList<Vec<u8>> =
            vec![b"path".to_vec(), b"to".to_vec(), b"resource".to_vec()]
                .into_iter()
                .collect();
        let uri_query: LinkedList<Vec<u8>> =
            vec![b"q=1".to_vec(), b"p=2".to_vec()].into_iter().collect();
        assert_eq!(
            &uri_path,
            unprotected_coap.get_option(CoapOption::UriPath).unwrap()
        );
        assert_eq!(
            &uri_query,
            unprotected_coap.get_option(CoapOption::UriQuery).unwrap()
        );
    }
}
