use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::{
    bytesrepr::{self, FromBytes, ToBytes},
    crypto::PublicKey,
    Digest,
};

const ACCOUNT_HASH_PREFIX: &str = "account-hash-";

/// Error parsing the `account-hash-…` text form.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccountHashParseError {
    #[error("missing 'account-hash-' prefix")]
    MissingPrefix,
    #[error("invalid account hash: {0}")]
    Hex(String),
}

/// Hash of an account's main public key, identifying the account on chain.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountHash([u8; Digest::LENGTH]);

impl AccountHash {
    pub const fn new(value: [u8; Digest::LENGTH]) -> Self {
        AccountHash(value)
    }

    /// Hashes `algorithm_name ++ 0x00 ++ raw_key_bytes`.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let name = public_key.algorithm().name().as_bytes();
        let raw = public_key.raw_bytes();
        let mut preimage = Vec::with_capacity(name.len() + 1 + raw.len());
        preimage.extend_from_slice(name);
        preimage.push(0);
        preimage.extend_from_slice(raw);
        AccountHash(Digest::hash(preimage).value())
    }

    pub fn value(&self) -> [u8; Digest::LENGTH] {
        self.0
    }

    /// `account-hash-` followed by lowercase hex.
    pub fn to_formatted_string(&self) -> String {
        format!("{}{}", ACCOUNT_HASH_PREFIX, hex::encode(self.0))
    }

    pub fn from_formatted_str(input: &str) -> Result<Self, AccountHashParseError> {
        let hex_part = input
            .strip_prefix(ACCOUNT_HASH_PREFIX)
            .ok_or(AccountHashParseError::MissingPrefix)?;
        let digest =
            Digest::from_hex(hex_part).map_err(|err| AccountHashParseError::Hex(err.to_string()))?;
        Ok(AccountHash(digest.value()))
    }
}

impl From<&PublicKey> for AccountHash {
    fn from(public_key: &PublicKey) -> Self {
        AccountHash::from_public_key(public_key)
    }
}

impl Debug for AccountHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AccountHash({})", hex::encode(self.0))
    }
}

impl Display for AccountHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_formatted_string())
    }
}

impl FromStr for AccountHash {
    type Err = AccountHashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountHash::from_formatted_str(s)
    }
}

impl ToBytes for AccountHash {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        self.0.to_bytes()
    }

    fn serialized_length(&self) -> usize {
        Digest::LENGTH
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        writer.extend_from_slice(&self.0);
        Ok(())
    }
}

impl FromBytes for AccountHash {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (raw, rem) = <[u8; Digest::LENGTH]>::from_bytes(bytes)?;
        Ok((AccountHash(raw), rem))
    }
}

impl Serialize for AccountHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_formatted_string().serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let formatted = String::deserialize(deserializer)?;
            AccountHash::from_formatted_str(&formatted).map_err(SerdeError::custom)
        } else {
            <[u8; Digest::LENGTH]>::deserialize(deserializer).map(AccountHash)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_hash_algorithm_name_separator_and_key() {
        let key = PublicKey::Ed25519([3; 32]);
        let mut preimage = b"ed25519".to_vec();
        preimage.push(0);
        preimage.extend_from_slice(&[3; 32]);
        assert_eq!(
            AccountHash::from_public_key(&key).value(),
            Digest::hash(preimage).value()
        );
    }

    #[test]
    fn should_separate_algorithms() {
        let ed = PublicKey::Ed25519([3; 32]);
        let mut secp_raw = [3; 33];
        secp_raw[0] = 2;
        let secp = PublicKey::Secp256k1(secp_raw);
        assert_ne!(ed.to_account_hash(), secp.to_account_hash());
    }

    #[test]
    fn should_round_trip_formatted_string() {
        let hash = AccountHash::new([0xab; 32]);
        let text = hash.to_string();
        assert_eq!(text, format!("account-hash-{}", "ab".repeat(32)));
        assert_eq!(text.parse::<AccountHash>().unwrap(), hash);
        assert_eq!(
            AccountHash::from_formatted_str(&"ab".repeat(32)),
            Err(AccountHashParseError::MissingPrefix)
        );
        assert!("account-hash-abcd".parse::<AccountHash>().is_err());
    }

    #[test]
    fn should_serialize_as_formatted_string() {
        let hash = AccountHash::new([1; 32]);
        let json = serde_json::to_value(hash).unwrap();
        assert_eq!(json, serde_json::json!(hash.to_formatted_string()));
        let parsed: AccountHash = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, hash);
    }
}
