//! A client and a server exchanging OSCORE protected requests in memory.
//!
//! The client asks for `/hello` and `/time`, then the first request is
//! delivered a second time and gets rejected by the server. Set `RUST_LOG`
//! to `debug` to see what the contexts do.

use coap_lite::{
    CoapOption, MessageClass, MessageType, Packet, RequestType, ResponseType,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use oscore_core::{
    ContextParams, IdContextStore, Result, SecurityContext, UriContextStore,
};

const MASTER_SECRET: [u8; 16] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C,
    0x0D, 0x0E, 0x0F, 0x10,
];
const MASTER_SALT: [u8; 8] = [0x9E, 0x7C, 0xA9, 0x22, 0x23, 0x78, 0x63, 0x40];
const CLIENT_ID: [u8; 1] = [0x02];
const SERVER_ID: [u8; 1] = [0x01];
const SERVER_URI: &str = "coap://localhost";

fn params(sender_id: &[u8], recipient_id: &[u8]) -> ContextParams {
    ContextParams::new(
        MASTER_SECRET.to_vec(),
        sender_id.to_vec(),
        recipient_id.to_vec(),
    )
    .master_salt(MASTER_SALT.to_vec())
}

/// The resource server, answering every request it can unprotect.
struct Server {
    contexts: IdContextStore,
}

impl Server {
    fn new() -> Result<Server> {
        let contexts = IdContextStore::new();
        contexts.add_context(Arc::new(SecurityContext::new(params(
            &SERVER_ID, &CLIENT_ID,
        ))?));

        Ok(Server { contexts })
    }

    /// Returns the response to an OSCORE request, protected if the request
    /// was authentic and a plain error response otherwise.
    fn handle(&self, oscore_msg: &[u8]) -> Result<Vec<u8>> {
        match self.contexts.unprotect_request(oscore_msg) {
            Ok((context, request, binding)) => {
                let request = Packet::from_bytes(&request)?;
                let response = respond(&request).to_bytes()?;
                context.protect_response(&response, &binding, true)
            }
            Err(e) => {
                warn!("Rejecting request: {}", e);
                let outer = Packet::from_bytes(oscore_msg)?;
                let code = e
                    .response_code()
                    .unwrap_or(ResponseType::InternalServerError);
                Ok(reply(&outer, code).to_bytes()?)
            }
        }
    }
}

/// Returns an empty acknowledgement to `request` with the given code.
fn reply(request: &Packet, code: ResponseType) -> Packet {
    let mut response = Packet::new();
    response.header.set_type(MessageType::Acknowledgement);
    response.header.message_id = request.header.message_id;
    response.header.code = MessageClass::Response(code);
    response.set_token(request.get_token().to_vec());

    response
}

/// Serves the two resources of the server.
fn respond(request: &Packet) -> Packet {
    let path: Vec<&[u8]> = request
        .get_option(CoapOption::UriPath)
        .map(|segments| segments.iter().map(Vec::as_slice).collect())
        .unwrap_or_default();
    let payload = match (request.header.code, path.as_slice()) {
        (MessageClass::Request(RequestType::Get), [b"hello"]) => {
            String::from("Hello World!")
        }
        (MessageClass::Request(RequestType::Get), [b"time"]) => {
            chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
        }
        _ => return reply(request, ResponseType::NotFound),
    };

    let mut response = reply(request, ResponseType::Content);
    // text/plain;charset=utf-8 is format 0, the empty uint
    response.add_option(CoapOption::ContentFormat, vec![]);
    response.payload = payload.into_bytes();

    response
}

/// Returns a confirmable GET request for a resource on the server.
fn get(message_id: u16, path: &str) -> Packet {
    let mut request = Packet::new();
    request.header.set_type(MessageType::Confirmable);
    request.header.code = MessageClass::Request(RequestType::Get);
    request.header.message_id = message_id;
    request.set_token(message_id.to_be_bytes().to_vec());
    request.add_option(CoapOption::UriHost, b"localhost".to_vec());
    request.add_option(CoapOption::UriPath, path.as_bytes().to_vec());

    request
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let clients = UriContextStore::new();
    clients.add_context(
        SERVER_URI,
        Arc::new(SecurityContext::new(
            params(&CLIENT_ID, &SERVER_ID).client(true),
        )?),
    );
    let server = Server::new()?;

    let mut first_request = None;
    for (message_id, path) in [(1, "hello"), (2, "time")].iter() {
        let uri = format!("{}/{}", SERVER_URI, path);
        let request = get(*message_id, path).to_bytes()?;
        let (context, protected, binding) =
            clients.protect_request(&uri, &request)?;
        info!(
            uri = %uri,
            piv = ?binding.piv(),
            size = protected.len(),
            "Sending protected request"
        );

        let protected_response = server.handle(&protected)?;
        let response = Packet::from_bytes(
            &context.unprotect_response(&protected_response, &binding)?,
        )?;
        info!(
            code = ?response.header.code,
            payload = %String::from_utf8_lossy(&response.payload),
            "Got response for /{}",
            path
        );

        first_request.get_or_insert(protected);
    }

    // An attacker replaying the first request gets nowhere
    if let Some(replayed) = first_request {
        let response = Packet::from_bytes(&server.handle(&replayed)?)?;
        info!(code = ?response.header.code, "Replayed request answered");
    }

    Ok(())
}
