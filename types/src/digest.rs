use std::{
    array::TryFromSliceError,
    fmt::{self, Debug, Display, Formatter},
};

use blake2::{digest::consts::U32, Blake2b, Digest as _};
use hex_fmt::HexFmt;
use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer};

use crate::bytesrepr::{self, FromBytes, ToBytes};

type Blake2b256 = Blake2b<U32>;

#[cfg(test)]
thread_local! {
    static HASH_INVOCATIONS: std::cell::Cell<usize> = std::cell::Cell::new(0);
}

/// Number of times [`Digest::hash`] has run on the current thread.
#[cfg(test)]
pub(crate) fn hash_invocations() -> usize {
    HASH_INVOCATIONS.with(std::cell::Cell::get)
}

/// The output of the hash function.
#[derive(Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Digest([u8; Digest::LENGTH]);

impl Digest {
    /// The number of bytes in a `Digest`.
    pub const LENGTH: usize = 32;

    /// BLAKE2b-256 of `data`, the hash every Casper node uses for deploy and body hashes.
    pub fn hash<T: AsRef<[u8]>>(data: T) -> Digest {
        #[cfg(test)]
        HASH_INVOCATIONS.with(|count| count.set(count.get() + 1));

        let mut hasher = Blake2b256::new();
        hasher.update(data.as_ref());
        Digest(hasher.finalize().into())
    }

    /// Returns the raw bytes.
    pub fn value(&self) -> [u8; Digest::LENGTH] {
        self.0
    }

    /// Lowercase hex of the full digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses 64 hex characters (either case).
    pub fn from_hex<T: AsRef<[u8]>>(hex_input: T) -> Result<Digest, DigestParseError> {
        let bytes = hex::decode(hex_input).map_err(|err| DigestParseError(err.to_string()))?;
        Digest::try_from(bytes.as_slice()).map_err(|_| {
            DigestParseError(format!(
                "expected {} bytes, got {}",
                Digest::LENGTH,
                bytes.len()
            ))
        })
    }
}

/// Error returned when hex input does not describe a digest.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid digest: {0}")]
pub struct DigestParseError(String);

impl<'a> TryFrom<&'a [u8]> for Digest {
    type Error = TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Digest, Self::Error> {
        <[u8; Digest::LENGTH]>::try_from(slice).map(Digest)
    }
}

impl From<[u8; Digest::LENGTH]> for Digest {
    fn from(arr: [u8; Digest::LENGTH]) -> Self {
        Digest(arr)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.to_hex().serialize(serializer)
        } else {
            self.0[..].serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let hex_string = String::deserialize(deserializer)?;
            Digest::from_hex(hex_string).map_err(SerdeError::custom)
        } else {
            let data = <Vec<u8>>::deserialize(deserializer)?;
            Digest::try_from(data.as_slice()).map_err(D::Error::custom)
        }
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", HexFmt(&self.0))
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", HexFmt(&self.0))
    }
}

impl ToBytes for Digest {
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

impl FromBytes for Digest {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (array, rem) = <[u8; Digest::LENGTH]>::from_bytes(bytes)?;
        Ok((Digest(array), rem))
    }
}
