//! The AEAD and key derivation algorithms a security context can use.

use aes::Aes128;
use ccm::{
    aead::{generic_array::GenericArray, Aead, NewAead, Payload},
    consts::{U13, U16, U7, U8},
    Ccm,
};
use core::convert::TryFrom;
use hkdf::Hkdf;
use serde::Deserialize;
use sha2::{Sha256, Sha512};

use crate::{error::Error, Result};

/// An AEAD algorithm, identified by its COSE algorithm number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i32")]
pub enum AeadAlgorithm {
    /// AES-CCM with 128 bit key, 64 bit tag and 13 byte nonce.
    AesCcm16_64_128,
    /// AES-CCM with 128 bit key, 64 bit tag and 7 byte nonce.
    AesCcm64_64_128,
    /// AES-CCM with 128 bit key, 128 bit tag and 13 byte nonce.
    AesCcm16_128_128,
    /// AES-CCM with 128 bit key, 128 bit tag and 7 byte nonce.
    AesCcm64_128_128,
}

impl AeadAlgorithm {
    /// Returns the COSE algorithm identifier.
    pub fn id(self) -> i32 {
        match self {
            AeadAlgorithm::AesCcm16_64_128 => 10,
            AeadAlgorithm::AesCcm64_64_128 => 12,
            AeadAlgorithm::AesCcm16_128_128 => 30,
            AeadAlgorithm::AesCcm64_128_128 => 32,
        }
    }

    /// Returns the key length in bytes.
    pub fn key_len(self) -> usize {
        16
    }

    /// Returns the nonce length in bytes.
    pub fn nonce_len(self) -> usize {
        match self {
            AeadAlgorithm::AesCcm16_64_128
            | AeadAlgorithm::AesCcm16_128_128 => 13,
            AeadAlgorithm::AesCcm64_64_128
            | AeadAlgorithm::AesCcm64_128_128 => 7,
        }
    }

    /// Returns the authentication tag length in bytes.
    pub fn tag_len(self) -> usize {
        match self {
            AeadAlgorithm::AesCcm16_64_128
            | AeadAlgorithm::AesCcm64_64_128 => 8,
            AeadAlgorithm::AesCcm16_128_128
            | AeadAlgorithm::AesCcm64_128_128 => 16,
        }
    }

    /// Returns the longest sender/recipient ID the nonce construction can
    /// hold.
    pub fn max_id_len(self) -> usize {
        self.nonce_len() - 6
    }

    /// Encrypts `plaintext` and appends the authentication tag.
    ///
    /// `key` and `nonce` must have the lengths this algorithm requires.
    pub(crate) fn seal(
        self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: plaintext,
            aad,
        };
        let result = match self {
            AeadAlgorithm::AesCcm16_64_128 => {
                seal_with::<Ccm<Aes128, U8, U13>>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_64_128 => {
                seal_with::<Ccm<Aes128, U8, U7>>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm16_128_128 => {
                seal_with::<Ccm<Aes128, U16, U13>>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_128_128 => {
                seal_with::<Ccm<Aes128, U16, U7>>(key, nonce, payload)
            }
        };

        result.map_err(|_| Error::Aead)
    }

    /// Verifies and decrypts `ciphertext`, which ends in the tag.
    ///
    /// Nothing but `AuthenticationFailed` comes back if verification fails.
    pub(crate) fn open(
        self,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: ciphertext,
            aad,
        };
        let result = match self {
            AeadAlgorithm::AesCcm16_64_128 => {
                open_with::<Ccm<Aes128, U8, U13>>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_64_128 => {
                open_with::<Ccm<Aes128, U8, U7>>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm16_128_128 => {
                open_with::<Ccm<Aes128, U16, U13>>(key, nonce, payload)
            }
            AeadAlgorithm::AesCcm64_128_128 => {
                open_with::<Ccm<Aes128, U16, U7>>(key, nonce, payload)
            }
        };

        result.map_err(|_| Error::AuthenticationFailed)
    }
}

impl Default for AeadAlgorithm {
    fn default() -> AeadAlgorithm {
        AeadAlgorithm::AesCcm16_64_128
    }
}

impl TryFrom<i32> for AeadAlgorithm {
    type Error = Error;

    fn try_from(id: i32) -> Result<AeadAlgorithm> {
        match id {
            10 => Ok(AeadAlgorithm::AesCcm16_64_128),
            12 => Ok(AeadAlgorithm::AesCcm64_64_128),
            30 => Ok(AeadAlgorithm::AesCcm16_128_128),
            32 => Ok(AeadAlgorithm::AesCcm64_128_128),
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }
}

fn seal_with<C: NewAead + Aead>(
    key: &[u8],
    nonce: &[u8],
    payload: Payload,
) -> core::result::Result<Vec<u8>, ccm::aead::Error> {
    let cipher = C::new(GenericArray::from_slice(key));
    cipher.encrypt(GenericArray::from_slice(nonce), payload)
}

fn open_with<C: NewAead + Aead>(
    key: &[u8],
    nonce: &[u8],
    payload: Payload,
) -> core::result::Result<Vec<u8>, ccm::aead::Error> {
    let cipher = C::new(GenericArray::from_slice(key));
    cipher.decrypt(GenericArray::from_slice(nonce), payload)
}

/// An HKDF variant, identified by its COSE algorithm number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i32")]
pub enum KdfAlgorithm {
    /// HKDF with SHA-256.
    HkdfSha256,
    /// HKDF with SHA-512.
    HkdfSha512,
}

impl KdfAlgorithm {
    /// Returns the COSE algorithm identifier.
    pub fn id(self) -> i32 {
        match self {
            KdfAlgorithm::HkdfSha256 => -10,
            KdfAlgorithm::HkdfSha512 => -11,
        }
    }

    /// Returns the derived key/IV for this `info` structure.
    ///
    /// # Arguments
    /// * `master_secret` - The master secret.
    /// * `master_salt` - The master salt.
    /// * `info` - The `info` structure, different for key and IV derivation.
    /// * `l` - The size of the key/nonce for the AEAD used, in bytes.
    pub(crate) fn derive(
        self,
        master_secret: &[u8],
        master_salt: &[u8],
        info: &[u8],
        l: usize,
    ) -> Result<Vec<u8>> {
        let mut okm = vec![0; l];
        match self {
            KdfAlgorithm::HkdfSha256 => {
                Hkdf::<Sha256>::new(Some(master_salt), master_secret)
                    .expand(info, &mut okm)?
            }
            KdfAlgorithm::HkdfSha512 => {
                Hkdf::<Sha512>::new(Some(master_salt), master_secret)
                    .expand(info, &mut okm)?
            }
        }

        Ok(okm)
    }
}

impl Default for KdfAlgorithm {
    fn default() -> KdfAlgorithm {
        KdfAlgorithm::HkdfSha256
    }
}

impl TryFrom<i32> for KdfAlgorithm {
    type Error = Error;

    fn try_from(id: i32) -> Result<KdfAlgorithm> {
        match id {
            -10 => Ok(KdfAlgorithm::HkdfSha256),
            -11 => Ok(KdfAlgorithm::HkdfSha512),
            other => Err(Error::UnsupportedAlgorithm(other)),
        }
    }
}
