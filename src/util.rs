use serde_bytes::Bytes;

use crate::{algorithm::AeadAlgorithm, cbor, Result};

/// The largest sender sequence number, bounded by the 5 byte Partial IV.
pub const MAX_SEQUENCE_NUMBER: u64 = (1 << 40) - 1;

/// Returns the CBOR encoded `info` structure.
///
/// # Arguments
/// * `id` - The sender ID or recipient ID (or empty for IV).
/// * `id_context` - The ID Context, encoded as `null` if absent.
/// * `alg_aead` - The AEAD algorithm the derived material is for.
/// * `type` - Either "Key" or "IV".
/// * `l` - The size of the key/nonce for the AEAD, in bytes.
pub fn build_info(
    id: &[u8],
    id_context: Option<&[u8]>,
    alg_aead: AeadAlgorithm,
    r#type: &str,
    l: usize,
) -> Result<Vec<u8>> {
    // (id, id_context, alg_aead, type, L)
    let info = (
        Bytes::new(id),
        id_context.map(Bytes::new),
        alg_aead.id(),
        r#type,
        l,
    );
    Ok(cbor::encode(info)?)
}

/// Returns the CBOR encoded AAD array.
///
/// There's no argument for class I options, because the standard doesn't
/// define any at this point.
pub fn build_aad_array(
    alg_aead: AeadAlgorithm,
    request_kid: &[u8],
    request_piv: &[u8],
) -> Result<Vec<u8>> {
    // (oscore_version, algorithms, request_kid, request_piv, options)
    let arr = (
        1,
        [alg_aead.id()],
        Bytes::new(request_kid),
        Bytes::new(request_piv),
        Bytes::new(&[]),
    );
    Ok(cbor::encode(arr)?)
}

/// Returns the AAD, an `Enc_structure` wrapping the AAD array.
pub fn build_aad(
    alg_aead: AeadAlgorithm,
    request_kid: &[u8],
    request_piv: &[u8],
) -> Result<Vec<u8>> {
    let aad_arr = build_aad_array(alg_aead, request_kid, request_piv)?;
    let aad = ("Encrypt0", Bytes::new(&[]), Bytes::new(&aad_arr));
    Ok(cbor::encode(aad)?)
}

/// Returns the nonce for the AEAD.
///
/// The nonce has the length of `common_iv`. `id_piv` must be at most six
/// bytes shorter than that and `piv` at most five bytes long, which holds
/// for IDs checked at context creation and for decoded OSCORE options.
pub fn compute_nonce(piv: &[u8], id_piv: &[u8], common_iv: &[u8]) -> Vec<u8> {
    let nonce_len = common_iv.len();
    let mut nonce = vec![0; nonce_len];
    // Size of ID_PIV in the first byte
    nonce[0] = id_piv.len() as u8;
    // ID_PIV left-padded to nonce length minus 6 bytes
    nonce[nonce_len - 5 - id_piv.len()..nonce_len - 5].copy_from_slice(id_piv);
    // Partial IV left-padded to 5 bytes
    nonce[nonce_len - piv.len()..].copy_from_slice(piv);
    for (b, iv) in nonce.iter_mut().zip(common_iv) {
        *b ^= iv;
    }

    nonce
}

/// Returns the `piv` as a u64.
pub fn piv_to_u64(piv: &[u8]) -> u64 {
    piv.iter().fold(0, |acc, &b| (acc << 8) | u64::from(b))
}

/// Returns the `piv` in its correct format (no leading zero bytes).
pub fn format_piv(piv: u64) -> Vec<u8> {
    let bytes = piv.to_be_bytes();
    // Zero is the single byte 0x00, everything else loses leading zeros
    let first = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}
