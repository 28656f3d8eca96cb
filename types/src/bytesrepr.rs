//! Canonical byte representation of everything that participates in a deploy hash.
//!
//! Every multi-byte integer is little-endian. Variable-length sequences (byte strings, UTF-8
//! strings, lists) carry a `u32` little-endian count prefix. Fixed-size arrays are written raw.

use std::fmt::{self, Debug, Formatter};

use hex_fmt::HexFmt;
use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The number of bytes in a serialized `u8`.
pub const U8_SERIALIZED_LENGTH: usize = 1;
/// The number of bytes in a serialized `u32`.
pub const U32_SERIALIZED_LENGTH: usize = 4;
/// The number of bytes in a serialized `u64`.
pub const U64_SERIALIZED_LENGTH: usize = 8;
/// The number of bytes in a serialized `bool`.
pub const BOOL_SERIALIZED_LENGTH: usize = 1;

pub(crate) const OPTION_NONE_TAG: u8 = 0;
pub(crate) const OPTION_SOME_TAG: u8 = 1;

/// Serialization and deserialization errors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Early end of stream while deserializing.
    #[error("deserialization error: early end of stream")]
    EarlyEndOfStream,
    /// Formatting error while deserializing.
    #[error("deserialization error: formatting")]
    Formatting,
    /// Not all input bytes were consumed in [`deserialize_from_slice`].
    #[error("deserialization error: left-over bytes")]
    LeftOverBytes,
    /// Out of memory error.
    #[error("serialization error: out of memory")]
    OutOfMemory,
    /// Nested type definitions went deeper than allowed.
    #[error("deserialization error: exceeded recursion depth")]
    ExceededRecursionDepth,
}

/// A type which can be serialized to a `Vec<u8>`.
pub trait ToBytes {
    /// Serializes `&self` to a `Vec<u8>`.
    fn to_bytes(&self) -> Result<Vec<u8>, Error>;

    /// Returns the length of the `Vec<u8>` which would be returned from a successful call to
    /// `to_bytes()`.
    fn serialized_length(&self) -> usize;

    /// Writes `&self` into a mutable `writer`.
    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        writer.extend(self.to_bytes()?);
        Ok(())
    }
}

/// A type which can be deserialized from a `Vec<u8>`.
pub trait FromBytes: Sized {
    /// Deserializes the slice into `Self`, returning the remainder.
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error>;
}

/// Returns a `Vec<u8>` with capacity for the serialized form of `to_be_serialized`.
pub fn allocate_buffer<T: ToBytes + ?Sized>(to_be_serialized: &T) -> Result<Vec<u8>, Error> {
    let serialized_length = to_be_serialized.serialized_length();
    if serialized_length > u32::MAX as usize {
        return Err(Error::OutOfMemory);
    }
    Ok(Vec::with_capacity(serialized_length))
}

/// Deserializes `bytes` into an instance of `T`.
///
/// Returns an error if the bytes cannot be deserialized into `T` or if not all of the input
/// bytes are consumed in the operation.
pub fn deserialize_from_slice<I: AsRef<[u8]>, O: FromBytes>(bytes: I) -> Result<O, Error> {
    let (value, remainder) = O::from_bytes(bytes.as_ref())?;
    if remainder.is_empty() {
        Ok(value)
    } else {
        Err(Error::LeftOverBytes)
    }
}

/// Splits `bytes` at `n`, failing rather than panicking if there are fewer than `n` bytes.
pub fn safe_split_at(bytes: &[u8], n: usize) -> Result<(&[u8], &[u8]), Error> {
    if n > bytes.len() {
        Err(Error::EarlyEndOfStream)
    } else {
        Ok(bytes.split_at(n))
    }
}

fn length_prefix(len: usize) -> Result<[u8; U32_SERIALIZED_LENGTH], Error> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| Error::OutOfMemory)
}

/// Writes `bytes` as a `u32` length prefix followed by the raw bytes.
pub(crate) fn write_byte_string(bytes: &[u8], writer: &mut Vec<u8>) -> Result<(), Error> {
    writer.extend_from_slice(&length_prefix(bytes.len())?);
    writer.extend_from_slice(bytes);
    Ok(())
}

/// Reads a `u32` length-prefixed byte string.
pub(crate) fn read_byte_string(bytes: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    let (len, remainder) = u32::from_bytes(bytes)?;
    safe_split_at(remainder, len as usize)
}

impl ToBytes for u8 {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(vec![*self])
    }

    fn serialized_length(&self) -> usize {
        U8_SERIALIZED_LENGTH
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        writer.push(*self);
        Ok(())
    }
}

impl FromBytes for u8 {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        match bytes.split_first() {
            None => Err(Error::EarlyEndOfStream),
            Some((byte, rem)) => Ok((*byte, rem)),
        }
    }
}

impl ToBytes for bool {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(vec![u8::from(*self)])
    }

    fn serialized_length(&self) -> usize {
        BOOL_SERIALIZED_LENGTH
    }
}

impl FromBytes for bool {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        match u8::from_bytes(bytes)? {
            (0, rem) => Ok((false, rem)),
            (1, rem) => Ok((true, rem)),
            _ => Err(Error::Formatting),
        }
    }
}

macro_rules! impl_bytesrepr_for_integer {
    ($type:ty) => {
        impl ToBytes for $type {
            fn to_bytes(&self) -> Result<Vec<u8>, Error> {
                Ok(self.to_le_bytes().to_vec())
            }

            fn serialized_length(&self) -> usize {
                std::mem::size_of::<$type>()
            }

            fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
                writer.extend_from_slice(&self.to_le_bytes());
                Ok(())
            }
        }

        impl FromBytes for $type {
            fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
                let (raw, rem) = safe_split_at(bytes, std::mem::size_of::<$type>())?;
                let value = <$type>::from_le_bytes(raw.try_into().map_err(|_| Error::Formatting)?);
                Ok((value, rem))
            }
        }
    };
}

impl_bytesrepr_for_integer!(i32);
impl_bytesrepr_for_integer!(i64);
impl_bytesrepr_for_integer!(u32);
impl_bytesrepr_for_integer!(u64);

impl ToBytes for () {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(Vec::new())
    }

    fn serialized_length(&self) -> usize {
        0
    }
}

impl FromBytes for () {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        Ok(((), bytes))
    }
}

impl ToBytes for str {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U32_SERIALIZED_LENGTH + self.len()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        write_byte_string(self.as_bytes(), writer)
    }
}

impl ToBytes for String {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        self.as_str().to_bytes()
    }

    fn serialized_length(&self) -> usize {
        self.as_str().serialized_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        self.as_str().write_bytes(writer)
    }
}

impl FromBytes for String {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (raw, rem) = read_byte_string(bytes)?;
        let value = String::from_utf8(raw.to_vec()).map_err(|_| Error::Formatting)?;
        Ok((value, rem))
    }
}

impl<T: ToBytes> ToBytes for Vec<T> {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U32_SERIALIZED_LENGTH + self.iter().map(ToBytes::serialized_length).sum::<usize>()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        writer.extend_from_slice(&length_prefix(self.len())?);
        for item in self {
            item.write_bytes(writer)?;
        }
        Ok(())
    }
}

impl<T: FromBytes> FromBytes for Vec<T> {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (count, mut stream) = u32::from_bytes(bytes)?;
        // Every item occupies at least one byte except `()`, so never trust `count` for capacity.
        let mut result = Vec::with_capacity((count as usize).min(stream.len()));
        for _ in 0..count {
            let (value, rem) = T::from_bytes(stream)?;
            result.push(value);
            stream = rem;
        }
        Ok((result, stream))
    }
}

impl<const N: usize> ToBytes for [u8; N] {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(self.to_vec())
    }

    fn serialized_length(&self) -> usize {
        N
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        writer.extend_from_slice(self);
        Ok(())
    }
}

impl<const N: usize> FromBytes for [u8; N] {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (raw, rem) = safe_split_at(bytes, N)?;
        let array = <[u8; N]>::try_from(raw).map_err(|_| Error::Formatting)?;
        Ok((array, rem))
    }
}

impl<T: ToBytes> ToBytes for Option<T> {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U8_SERIALIZED_LENGTH
            + match self {
                Some(value) => value.serialized_length(),
                None => 0,
            }
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        match self {
            None => writer.push(OPTION_NONE_TAG),
            Some(value) => {
                writer.push(OPTION_SOME_TAG);
                value.write_bytes(writer)?;
            }
        }
        Ok(())
    }
}

impl<T: FromBytes> FromBytes for Option<T> {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (tag, rem) = u8::from_bytes(bytes)?;
        match tag {
            OPTION_NONE_TAG => Ok((None, rem)),
            OPTION_SOME_TAG => {
                let (value, rem) = T::from_bytes(rem)?;
                Ok((Some(value), rem))
            }
            _ => Err(Error::Formatting),
        }
    }
}

/// A length-prefixed byte string, hex-encoded in human-readable formats.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Constructs an empty byte string.
    pub fn new() -> Self {
        Bytes(Vec::new())
    }

    /// Returns the inner bytes.
    pub fn inner_bytes(&self) -> &Vec<u8> {
        &self.0
    }

    /// Consumes `self`, returning the inner bytes.
    pub fn take_inner(self) -> Vec<u8> {
        self.0
    }

    /// Returns the number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        Bytes(vec)
    }
}

impl From<&[u8]> for Bytes {
    fn from(slice: &[u8]) -> Self {
        Bytes(slice.to_vec())
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Bytes {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes({})", HexFmt(&self.0))
    }
}

impl ToBytes for Bytes {
    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U32_SERIALIZED_LENGTH + self.0.len()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), Error> {
        write_byte_string(&self.0, writer)
    }
}

impl FromBytes for Bytes {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), Error> {
        let (raw, rem) = read_byte_string(bytes)?;
        Ok((Bytes(raw.to_vec()), rem))
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            hex::encode(&self.0).serialize(serializer)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let hex_string = String::deserialize(deserializer)?;
            hex::decode(hex_string)
                .map(Bytes)
                .map_err(SerdeError::custom)
        } else {
            Ok(Bytes(<Vec<u8>>::deserialize(deserializer)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn byte_strings_and_strings_carry_little_endian_length() {
        assert_eq!(
            "abc".to_string().to_bytes().unwrap(),
            vec![3, 0, 0, 0, b'a', b'b', b'c']
        );
        assert_eq!(
            Bytes::from(vec![0xde, 0xad]).to_bytes().unwrap(),
            vec![2, 0, 0, 0, 0xde, 0xad]
        );
        assert_eq!(Bytes::new().to_bytes().unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn vec_of_bytes_matches_byte_string_layout() {
        let as_vec = vec![1u8, 2, 3].to_bytes().unwrap();
        let as_bytes = Bytes::from(vec![1u8, 2, 3]).to_bytes().unwrap();
        assert_eq!(as_vec, as_bytes);
    }

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(1u64.to_bytes().unwrap(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            0x0102_0304u32.to_bytes().unwrap(),
            vec![0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!((-1i64).to_bytes().unwrap(), vec![0xff; 8]);
    }

    #[test]
    fn options_use_explicit_tag() {
        assert_eq!(None::<u64>.to_bytes().unwrap(), vec![0]);
        assert_eq!(
            Some(7u64).to_bytes().unwrap(),
            vec![1, 7, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(Some(7u64).serialized_length(), 9);
    }

    #[test]
    fn arrays_are_written_raw() {
        let array = [9u8; 32];
        assert_eq!(array.to_bytes().unwrap(), array.to_vec());
        let parsed: [u8; 32] = deserialize_from_slice(array).unwrap();
        assert_eq!(parsed, array);
    }

    #[test]
    fn should_fail_on_truncated_input() {
        let bytes = "hello".to_string().to_bytes().unwrap();
        let result = String::from_bytes(&bytes[..bytes.len() - 1]);
        assert_eq!(result, Err(Error::EarlyEndOfStream));
        assert_eq!(u64::from_bytes(&[1, 2, 3]), Err(Error::EarlyEndOfStream));
    }

    #[test]
    fn should_fail_on_left_over_bytes() {
        let mut bytes = 5u32.to_bytes().unwrap();
        bytes.push(0);
        assert_eq!(
            deserialize_from_slice::<_, u32>(bytes),
            Err(Error::LeftOverBytes)
        );
    }

    #[test]
    fn should_reject_invalid_utf8_and_bool() {
        let bytes = vec![2, 0, 0, 0, 0xff, 0xfe];
        assert_eq!(String::from_bytes(&bytes), Err(Error::Formatting));
        assert_eq!(bool::from_bytes(&[2]), Err(Error::Formatting));
        assert_eq!(Option::<u8>::from_bytes(&[3, 1]), Err(Error::Formatting));
    }

    #[test]
    fn should_not_preallocate_from_untrusted_count() {
        let bytes = u32::MAX.to_bytes().unwrap();
        assert_eq!(Vec::<u64>::from_bytes(&bytes), Err(Error::EarlyEndOfStream));
    }

    #[test]
    fn bytes_serialize_as_hex_in_json() {
        let bytes = Bytes::from(vec![0xca, 0xfe]);
        let json = serde_json::to_string(&bytes).unwrap();
        assert_eq!(json, "\"cafe\"");
        let parsed: Bytes = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bytes);
    }
}
