//! Public keys, signatures and the algorithm tags that prefix them on the wire.

use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use ed25519_dalek::Verifier as _;
use hex_fmt::HexFmt;
use k256::ecdsa::signature::Verifier as _;
use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{
    account_hash::AccountHash,
    bytesrepr::{self, FromBytes, ToBytes, U8_SERIALIZED_LENGTH},
};

/// Length of an Ed25519 public key.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;
/// Length of a compressed SEC1 secp256k1 public key.
pub const SECP256K1_PUBLIC_KEY_LENGTH: usize = 33;
/// Length of a signature for either algorithm.
pub const SIGNATURE_LENGTH: usize = 64;

const ED25519_TAG: u8 = 1;
const SECP256K1_TAG: u8 = 2;

/// The signature scheme of a key, written as a one-byte prefix wherever a key or signature is
/// encoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyAlgorithm {
    Ed25519,
    Secp256k1,
}

impl KeyAlgorithm {
    /// The wire tag.
    pub const fn tag(self) -> u8 {
        match self {
            KeyAlgorithm::Ed25519 => ED25519_TAG,
            KeyAlgorithm::Secp256k1 => SECP256K1_TAG,
        }
    }

    /// The lowercase name mixed into account hashes.
    pub const fn name(self) -> &'static str {
        match self {
            KeyAlgorithm::Ed25519 => "ed25519",
            KeyAlgorithm::Secp256k1 => "secp256k1",
        }
    }

    /// Raw public key length for this algorithm.
    pub const fn public_key_length(self) -> usize {
        match self {
            KeyAlgorithm::Ed25519 => ED25519_PUBLIC_KEY_LENGTH,
            KeyAlgorithm::Secp256k1 => SECP256K1_PUBLIC_KEY_LENGTH,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, KeyError> {
        match tag {
            ED25519_TAG => Ok(KeyAlgorithm::Ed25519),
            SECP256K1_TAG => Ok(KeyAlgorithm::Secp256k1),
            other => Err(KeyError::UnknownAlgorithmTag(other)),
        }
    }
}

impl Display for KeyAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors parsing or validating keys and signatures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("unknown key algorithm tag {0}")]
    UnknownAlgorithmTag(u8),
    #[error("{algorithm} value must be {expected} bytes, got {got}")]
    InvalidLength {
        algorithm: KeyAlgorithm,
        expected: usize,
        got: usize,
    },
    #[error("empty key or signature")]
    Empty,
    #[error("invalid hex: {0}")]
    Hex(String),
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),
}

impl From<hex::FromHexError> for KeyError {
    fn from(error: hex::FromHexError) -> Self {
        KeyError::Hex(error.to_string())
    }
}

/// Error returned when a signature does not verify against a key.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("signature algorithm {signature} does not match key algorithm {key}")]
    AlgorithmMismatch {
        key: KeyAlgorithm,
        signature: KeyAlgorithm,
    },
    #[error("malformed public key: {0}")]
    MalformedKey(String),
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    #[error("signature does not verify: {0}")]
    BadSignature(String),
}

fn split_tagged_hex(input: &str) -> Result<(KeyAlgorithm, Vec<u8>), KeyError> {
    let bytes = hex::decode(input)?;
    let (tag, raw) = bytes.split_first().ok_or(KeyError::Empty)?;
    Ok((KeyAlgorithm::from_tag(*tag)?, raw.to_vec()))
}

fn fixed<const N: usize>(algorithm: KeyAlgorithm, raw: &[u8]) -> Result<[u8; N], KeyError> {
    <[u8; N]>::try_from(raw).map_err(|_| KeyError::InvalidLength {
        algorithm,
        expected: N,
        got: raw.len(),
    })
}

/// A public key: algorithm plus raw key bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PublicKey {
    Ed25519([u8; ED25519_PUBLIC_KEY_LENGTH]),
    /// Compressed SEC1 encoding.
    Secp256k1([u8; SECP256K1_PUBLIC_KEY_LENGTH]),
}

impl PublicKey {
    /// Builds a key from its algorithm and raw bytes, checking the length.
    pub fn from_raw(algorithm: KeyAlgorithm, raw: &[u8]) -> Result<Self, KeyError> {
        match algorithm {
            KeyAlgorithm::Ed25519 => Ok(PublicKey::Ed25519(fixed(algorithm, raw)?)),
            KeyAlgorithm::Secp256k1 => Ok(PublicKey::Secp256k1(fixed(algorithm, raw)?)),
        }
    }

    /// Parses the textual form: two hex chars of algorithm tag followed by the raw key in hex.
    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let (algorithm, raw) = split_tagged_hex(input)?;
        PublicKey::from_raw(algorithm, &raw)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
            PublicKey::Secp256k1(_) => KeyAlgorithm::Secp256k1,
        }
    }

    /// The key bytes without the algorithm tag.
    pub fn raw_bytes(&self) -> &[u8] {
        match self {
            PublicKey::Ed25519(bytes) => bytes,
            PublicKey::Secp256k1(bytes) => bytes,
        }
    }

    /// Tag and key bytes as lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("{:02x}{}", self.algorithm().tag(), hex::encode(self.raw_bytes()))
    }

    pub fn to_account_hash(&self) -> AccountHash {
        AccountHash::from_public_key(self)
    }

    /// Checks `signature` over `message` against this key.
    pub fn verify<T: AsRef<[u8]>>(
        &self,
        message: T,
        signature: &Signature,
    ) -> Result<(), VerificationError> {
        match (self, signature) {
            (PublicKey::Ed25519(key_bytes), Signature::Ed25519(signature_bytes)) => {
                let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(key_bytes)
                    .map_err(|err| VerificationError::MalformedKey(err.to_string()))?;
                let signature = ed25519_dalek::Signature::from_bytes(signature_bytes);
                verifying_key
                    .verify(message.as_ref(), &signature)
                    .map_err(|err| VerificationError::BadSignature(err.to_string()))
            }
            (PublicKey::Secp256k1(key_bytes), Signature::Secp256k1(signature_bytes)) => {
                let verifying_key = k256::ecdsa::VerifyingKey::from_sec1_bytes(key_bytes)
                    .map_err(|err| VerificationError::MalformedKey(err.to_string()))?;
                let signature = k256::ecdsa::Signature::from_slice(signature_bytes)
                    .map_err(|err| VerificationError::MalformedSignature(err.to_string()))?;
                verifying_key
                    .verify(message.as_ref(), &signature)
                    .map_err(|err| VerificationError::BadSignature(err.to_string()))
            }
            _ => Err(VerificationError::AlgorithmMismatch {
                key: self.algorithm(),
                signature: signature.algorithm(),
            }),
        }
    }
}

impl Debug for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey::{}({})", self.algorithm(), HexFmt(self.raw_bytes()))
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::from_hex(s)
    }
}

impl ToBytes for PublicKey {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U8_SERIALIZED_LENGTH + self.algorithm().public_key_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        writer.push(self.algorithm().tag());
        writer.extend_from_slice(self.raw_bytes());
        Ok(())
    }
}

impl FromBytes for PublicKey {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (tag, rem) = u8::from_bytes(bytes)?;
        match KeyAlgorithm::from_tag(tag).map_err(|_| bytesrepr::Error::Formatting)? {
            KeyAlgorithm::Ed25519 => {
                let (raw, rem) = <[u8; ED25519_PUBLIC_KEY_LENGTH]>::from_bytes(rem)?;
                Ok((PublicKey::Ed25519(raw), rem))
            }
            KeyAlgorithm::Secp256k1 => {
                let (raw, rem) = <[u8; SECP256K1_PUBLIC_KEY_LENGTH]>::from_bytes(rem)?;
                Ok((PublicKey::Secp256k1(raw), rem))
            }
        }
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_hex().serialize(serializer)
        } else {
            let bytes = self.to_bytes().map_err(serde::ser::Error::custom)?;
            bytes.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let hex_string = String::deserialize(deserializer)?;
            PublicKey::from_hex(&hex_string).map_err(SerdeError::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            bytesrepr::deserialize_from_slice(bytes).map_err(SerdeError::custom)
        }
    }
}

/// A signature: algorithm plus 64 raw signature bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signature {
    Ed25519([u8; SIGNATURE_LENGTH]),
    /// Compact `r || s` form.
    Secp256k1([u8; SIGNATURE_LENGTH]),
}

impl Signature {
    pub fn from_raw(algorithm: KeyAlgorithm, raw: &[u8]) -> Result<Self, KeyError> {
        let bytes = fixed::<SIGNATURE_LENGTH>(algorithm, raw)?;
        Ok(match algorithm {
            KeyAlgorithm::Ed25519 => Signature::Ed25519(bytes),
            KeyAlgorithm::Secp256k1 => Signature::Secp256k1(bytes),
        })
    }

    pub fn from_hex(input: &str) -> Result<Self, KeyError> {
        let (algorithm, raw) = split_tagged_hex(input)?;
        Signature::from_raw(algorithm, &raw)
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Signature::Ed25519(_) => KeyAlgorithm::Ed25519,
            Signature::Secp256k1(_) => KeyAlgorithm::Secp256k1,
        }
    }

    pub fn raw_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        match self {
            Signature::Ed25519(bytes) | Signature::Secp256k1(bytes) => bytes,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("{:02x}{}", self.algorithm().tag(), hex::encode(self.raw_bytes()))
    }
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Signature::{}({})", self.algorithm(), HexFmt(self.raw_bytes()))
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl ToBytes for Signature {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U8_SERIALIZED_LENGTH + SIGNATURE_LENGTH
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        writer.push(self.algorithm().tag());
        writer.extend_from_slice(self.raw_bytes());
        Ok(())
    }
}

impl FromBytes for Signature {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (tag, rem) = u8::from_bytes(bytes)?;
        let algorithm = KeyAlgorithm::from_tag(tag).map_err(|_| bytesrepr::Error::Formatting)?;
        let (raw, rem) = <[u8; SIGNATURE_LENGTH]>::from_bytes(rem)?;
        let signature = match algorithm {
            KeyAlgorithm::Ed25519 => Signature::Ed25519(raw),
            KeyAlgorithm::Secp256k1 => Signature::Secp256k1(raw),
        };
        Ok((signature, rem))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_hex().serialize(serializer)
        } else {
            let bytes = self.to_bytes().map_err(serde::ser::Error::custom)?;
            bytes.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let hex_string = String::deserialize(deserializer)?;
            Signature::from_hex(&hex_string).map_err(SerdeError::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            bytesrepr::deserialize_from_slice(bytes).map_err(SerdeError::custom)
        }
    }
}
