//! 512-bit unsigned amounts and mote/CSPR helpers.

use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    bytesrepr::{self, FromBytes, ToBytes, U8_SERIALIZED_LENGTH},
    validation::ValidationError,
};

#[allow(
    clippy::assign_op_pattern,
    clippy::ptr_offset_with_cast,
    clippy::manual_range_contains,
    clippy::range_plus_one,
    clippy::transmute_ptr_to_ptr,
    clippy::reversed_empty_ranges,
    clippy::manual_div_ceil
)]
mod inner {
    uint::construct_uint! {
        /// Little-endian 512-bit unsigned integer.
        pub struct U512(8);
    }
}

pub use inner::U512;

/// Number of motes in one CSPR.
pub const MOTES_PER_CSPR: u64 = 1_000_000_000;

const U512_MAX_BYTES: usize = 64;

impl ToBytes for U512 {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U8_SERIALIZED_LENGTH + trimmed_length(self)
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        let mut le = [0u8; U512_MAX_BYTES];
        self.to_little_endian(&mut le);
        let len = trimmed_length(self);
        writer.push(len as u8);
        writer.extend_from_slice(&le[..len]);
        Ok(())
    }
}

impl FromBytes for U512 {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (len, rem) = u8::from_bytes(bytes)?;
        if len as usize > U512_MAX_BYTES {
            return Err(bytesrepr::Error::Formatting);
        }
        let (raw, rem) = bytesrepr::safe_split_at(rem, len as usize)?;
        Ok((U512::from_little_endian(raw), rem))
    }
}

fn trimmed_length(value: &U512) -> usize {
    (value.bits() + 7) / 8
}

impl Serialize for U512 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for U512 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let decimal = String::deserialize(deserializer)?;
        parse_motes(&decimal).map_err(SerdeError::custom)
    }
}

/// Parses a decimal string of motes. Signs, whitespace, separators and empty input are rejected.
pub fn parse_motes(input: &str) -> Result<U512, ValidationError> {
    let malformed = || ValidationError::MalformedAmount(input.to_string());
    if input.is_empty() || !input.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(malformed());
    }
    U512::from_dec_str(input).map_err(|_| malformed())
}

/// Converts whole CSPR to motes.
pub fn cspr_to_motes(cspr: u64) -> U512 {
    U512::from(cspr) * U512::from(MOTES_PER_CSPR)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_trim_leading_zero_bytes() {
        assert_eq!(U512::zero().to_bytes().unwrap(), vec![0]);
        assert_eq!(U512::from(1).to_bytes().unwrap(), vec![1, 1]);
        assert_eq!(U512::from(256).to_bytes().unwrap(), vec![2, 0, 1]);
        assert_eq!(
            U512::from(2_500_000_000u64).to_bytes().unwrap(),
            vec![4, 0x00, 0xf9, 0x02, 0x95]
        );
        assert_eq!(U512::MAX.to_bytes().unwrap().len(), 65);
    }

    #[test]
    fn should_read_back_trimmed_bytes() {
        for value in [U512::zero(), U512::from(255), U512::MAX, cspr_to_motes(7)] {
            let bytes = value.to_bytes().unwrap();
            assert_eq!(bytes.len(), value.serialized_length());
            let parsed: U512 = bytesrepr::deserialize_from_slice(bytes).unwrap();
            assert_eq!(parsed, value);
        }
        assert_eq!(U512::from_bytes(&[65]), Err(bytesrepr::Error::Formatting));
        assert_eq!(U512::from_bytes(&[2, 1]), Err(bytesrepr::Error::EarlyEndOfStream));
    }

    #[test]
    fn should_parse_decimal_motes() {
        assert_eq!(parse_motes("2500000000").unwrap(), U512::from(2_500_000_000u64));
        assert_eq!(parse_motes("0").unwrap(), U512::zero());
        for bad in ["", "-1", "1.5", " 1", "1_000", "0x10", "abc"] {
            assert_eq!(
                parse_motes(bad),
                Err(ValidationError::MalformedAmount(bad.to_string()))
            );
        }
    }

    #[test]
    fn should_convert_cspr() {
        assert_eq!(cspr_to_motes(3), U512::from(3_000_000_000u64));
    }

    #[test]
    fn should_serialize_as_decimal_string() {
        let value = U512::from(123_456u64);
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"123456\"");
        let parsed: U512 = serde_json::from_str("\"123456\"").unwrap();
        assert_eq!(parsed, value);
        assert!(serde_json::from_str::<U512>("\"12a\"").is_err());
    }
}
