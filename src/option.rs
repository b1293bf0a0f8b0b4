//! The value of the OSCORE option, the compressed COSE header.

use coap_lite::{CoapOption, Packet};

use crate::{error::Error, Result};

const PIV_LEN_MASK: u8 = 0b0000_0111;
const KID_FLAG: u8 = 0b0000_1000;
const KID_CONTEXT_FLAG: u8 = 0b0001_0000;
const RESERVED_MASK: u8 = 0b1110_0000;

/// The fields carried in the OSCORE option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OscoreOption {
    /// The Partial IV.
    pub piv: Option<Vec<u8>>,
    /// The kid context, which is the ID Context.
    pub kid_context: Option<Vec<u8>>,
    /// The key ID, which is the sender ID.
    pub kid: Option<Vec<u8>>,
}

impl OscoreOption {
    /// Returns the value of the OSCORE option.
    pub fn encode(&self) -> Vec<u8> {
        let piv = self.piv.as_deref().unwrap_or_default();
        let mut flags = piv.len() as u8 & PIV_LEN_MASK;
        if self.kid.is_some() {
            flags |= KID_FLAG;
        }
        if self.kid_context.is_some() {
            flags |= KID_CONTEXT_FLAG;
        }
        // If we have neither kid nor piv, our option has no value
        if flags == 0 {
            return Vec::new();
        }

        let mut option = vec![flags];
        option.extend_from_slice(piv);
        if let Some(kid_context) = &self.kid_context {
            option.push(kid_context.len() as u8);
            option.extend_from_slice(kid_context);
        }
        if let Some(kid) = &self.kid {
            option.extend_from_slice(kid);
        }

        option
    }

    /// Decodes the value of the OSCORE option.
    pub fn decode(value: &[u8]) -> Result<OscoreOption> {
        let (flags, mut rest) = match value.split_first() {
            Some((&flags, rest)) => (flags, rest),
            // Handle empty option
            None => return Ok(OscoreOption::default()),
        };
        // A leading zero byte would have been left out by the sender
        if flags == 0 || flags & RESERVED_MASK != 0 {
            return Err(Error::MalformedOption);
        }

        let piv = match (flags & PIV_LEN_MASK) as usize {
            0 => None,
            // Lengths 6 and 7 are reserved
            n if n > 5 || n > rest.len() => {
                return Err(Error::MalformedOption)
            }
            n => {
                let (piv, remaining) = rest.split_at(n);
                rest = remaining;
                Some(piv.to_vec())
            }
        };

        let kid_context = if flags & KID_CONTEXT_FLAG != 0 {
            let (&s, remaining) =
                rest.split_first().ok_or(Error::MalformedOption)?;
            if remaining.len() < s as usize {
                return Err(Error::MalformedOption);
            }
            let (kid_context, remaining) = remaining.split_at(s as usize);
            rest = remaining;
            Some(kid_context.to_vec())
        } else {
            None
        };

        let kid = if flags & KID_FLAG != 0 {
            Some(rest.to_vec())
        } else if rest.is_empty() {
            None
        } else {
            // Trailing bytes without a kid flag
            return Err(Error::MalformedOption);
        };

        Ok(OscoreOption {
            piv,
            kid_context,
            kid,
        })
    }

    /// Returns the decoded OSCORE option of the message.
    pub fn from_packet(message: &Packet) -> Result<OscoreOption> {
        let value = message
            .get_option(CoapOption::Oscore)
            .ok_or(Error::NoOscoreOption)?
            .front()
            .ok_or(Error::NoOscoreOption)?;

        OscoreOption::decode(value)
    }
}
