//! Typed values passed as runtime arguments: the `CLType` tree and the serialized `CLValue`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

use crate::{
    account_hash::AccountHash,
    bytesrepr::{self, Bytes, FromBytes, ToBytes, U32_SERIALIZED_LENGTH, U8_SERIALIZED_LENGTH},
    crypto::PublicKey,
    U512,
};

const CL_TYPE_RECURSION_DEPTH: u8 = 50;

const CL_TYPE_TAG_BOOL: u8 = 0;
const CL_TYPE_TAG_I32: u8 = 1;
const CL_TYPE_TAG_I64: u8 = 2;
const CL_TYPE_TAG_U8: u8 = 3;
const CL_TYPE_TAG_U32: u8 = 4;
const CL_TYPE_TAG_U64: u8 = 5;
const CL_TYPE_TAG_U128: u8 = 6;
const CL_TYPE_TAG_U256: u8 = 7;
const CL_TYPE_TAG_U512: u8 = 8;
const CL_TYPE_TAG_UNIT: u8 = 9;
const CL_TYPE_TAG_STRING: u8 = 10;
const CL_TYPE_TAG_KEY: u8 = 11;
const CL_TYPE_TAG_UREF: u8 = 12;
const CL_TYPE_TAG_OPTION: u8 = 13;
const CL_TYPE_TAG_LIST: u8 = 14;
const CL_TYPE_TAG_BYTE_ARRAY: u8 = 15;
const CL_TYPE_TAG_RESULT: u8 = 16;
const CL_TYPE_TAG_MAP: u8 = 17;
const CL_TYPE_TAG_TUPLE1: u8 = 18;
const CL_TYPE_TAG_TUPLE2: u8 = 19;
const CL_TYPE_TAG_TUPLE3: u8 = 20;
const CL_TYPE_TAG_ANY: u8 = 21;
const CL_TYPE_TAG_PUBLIC_KEY: u8 = 22;

/// The type of a [`CLValue`], encoded as a tag byte followed by any nested types.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum CLType {
    Bool,
    I32,
    I64,
    U8,
    U32,
    U64,
    U128,
    U256,
    U512,
    Unit,
    String,
    Key,
    URef,
    PublicKey,
    Option(Box<CLType>),
    List(Box<CLType>),
    ByteArray(u32),
    Result { ok: Box<CLType>, err: Box<CLType> },
    Map { key: Box<CLType>, value: Box<CLType> },
    Tuple1([Box<CLType>; 1]),
    Tuple2([Box<CLType>; 2]),
    Tuple3([Box<CLType>; 3]),
    Any,
}

impl CLType {
    fn tag(&self) -> u8 {
        match self {
            CLType::Bool => CL_TYPE_TAG_BOOL,
            CLType::I32 => CL_TYPE_TAG_I32,
            CLType::I64 => CL_TYPE_TAG_I64,
            CLType::U8 => CL_TYPE_TAG_U8,
            CLType::U32 => CL_TYPE_TAG_U32,
            CLType::U64 => CL_TYPE_TAG_U64,
            CLType::U128 => CL_TYPE_TAG_U128,
            CLType::U256 => CL_TYPE_TAG_U256,
            CLType::U512 => CL_TYPE_TAG_U512,
            CLType::Unit => CL_TYPE_TAG_UNIT,
            CLType::String => CL_TYPE_TAG_STRING,
            CLType::Key => CL_TYPE_TAG_KEY,
            CLType::URef => CL_TYPE_TAG_UREF,
            CLType::PublicKey => CL_TYPE_TAG_PUBLIC_KEY,
            CLType::Option(_) => CL_TYPE_TAG_OPTION,
            CLType::List(_) => CL_TYPE_TAG_LIST,
            CLType::ByteArray(_) => CL_TYPE_TAG_BYTE_ARRAY,
            CLType::Result { .. } => CL_TYPE_TAG_RESULT,
            CLType::Map { .. } => CL_TYPE_TAG_MAP,
            CLType::Tuple1(_) => CL_TYPE_TAG_TUPLE1,
            CLType::Tuple2(_) => CL_TYPE_TAG_TUPLE2,
            CLType::Tuple3(_) => CL_TYPE_TAG_TUPLE3,
            CLType::Any => CL_TYPE_TAG_ANY,
        }
    }

    fn from_bytes_with_depth(bytes: &[u8], depth: u8) -> Result<(Self, &[u8]), bytesrepr::Error> {
        if depth >= CL_TYPE_RECURSION_DEPTH {
            return Err(bytesrepr::Error::ExceededRecursionDepth);
        }
        let depth = depth + 1;
        fn nested(bytes: &[u8], depth: u8) -> Result<(Box<CLType>, &[u8]), bytesrepr::Error> {
            CLType::from_bytes_with_depth(bytes, depth).map(|(cl_type, rem)| (Box::new(cl_type), rem))
        }
        let (tag, rem) = u8::from_bytes(bytes)?;
        let simple = match tag {
            CL_TYPE_TAG_BOOL => Some(CLType::Bool),
            CL_TYPE_TAG_I32 => Some(CLType::I32),
            CL_TYPE_TAG_I64 => Some(CLType::I64),
            CL_TYPE_TAG_U8 => Some(CLType::U8),
            CL_TYPE_TAG_U32 => Some(CLType::U32),
            CL_TYPE_TAG_U64 => Some(CLType::U64),
            CL_TYPE_TAG_U128 => Some(CLType::U128),
            CL_TYPE_TAG_U256 => Some(CLType::U256),
            CL_TYPE_TAG_U512 => Some(CLType::U512),
            CL_TYPE_TAG_UNIT => Some(CLType::Unit),
            CL_TYPE_TAG_STRING => Some(CLType::String),
            CL_TYPE_TAG_KEY => Some(CLType::Key),
            CL_TYPE_TAG_UREF => Some(CLType::URef),
            CL_TYPE_TAG_PUBLIC_KEY => Some(CLType::PublicKey),
            CL_TYPE_TAG_ANY => Some(CLType::Any),
            _ => None,
        };
        if let Some(cl_type) = simple {
            return Ok((cl_type, rem));
        }
        match tag {
            CL_TYPE_TAG_OPTION => {
                let (inner, rem) = nested(rem, depth)?;
                Ok((CLType::Option(inner), rem))
            }
            CL_TYPE_TAG_LIST => {
                let (inner, rem) = nested(rem, depth)?;
                Ok((CLType::List(inner), rem))
            }
            CL_TYPE_TAG_BYTE_ARRAY => {
                let (len, rem) = u32::from_bytes(rem)?;
                Ok((CLType::ByteArray(len), rem))
            }
            CL_TYPE_TAG_RESULT => {
                let (ok, rem) = nested(rem, depth)?;
                let (err, rem) = nested(rem, depth)?;
                Ok((CLType::Result { ok, err }, rem))
            }
            CL_TYPE_TAG_MAP => {
                let (key, rem) = nested(rem, depth)?;
                let (value, rem) = nested(rem, depth)?;
                Ok((CLType::Map { key, value }, rem))
            }
            CL_TYPE_TAG_TUPLE1 => {
                let (first, rem) = nested(rem, depth)?;
                Ok((CLType::Tuple1([first]), rem))
            }
            CL_TYPE_TAG_TUPLE2 => {
                let (first, rem) = nested(rem, depth)?;
                let (second, rem) = nested(rem, depth)?;
                Ok((CLType::Tuple2([first, second]), rem))
            }
            CL_TYPE_TAG_TUPLE3 => {
                let (first, rem) = nested(rem, depth)?;
                let (second, rem) = nested(rem, depth)?;
                let (third, rem) = nested(rem, depth)?;
                Ok((CLType::Tuple3([first, second, third]), rem))
            }
            _ => Err(bytesrepr::Error::Formatting),
        }
    }
}

impl ToBytes for CLType {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        U8_SERIALIZED_LENGTH
            + match self {
                CLType::Option(inner) | CLType::List(inner) => inner.serialized_length(),
                CLType::ByteArray(_) => U32_SERIALIZED_LENGTH,
                CLType::Result { ok, err } => ok.serialized_length() + err.serialized_length(),
                CLType::Map { key, value } => key.serialized_length() + value.serialized_length(),
                CLType::Tuple1(types) => types.iter().map(|t| t.serialized_length()).sum::<usize>(),
                CLType::Tuple2(types) => types.iter().map(|t| t.serialized_length()).sum::<usize>(),
                CLType::Tuple3(types) => types.iter().map(|t| t.serialized_length()).sum::<usize>(),
                _ => 0,
            }
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        writer.push(self.tag());
        match self {
            CLType::Option(inner) | CLType::List(inner) => inner.write_bytes(writer),
            CLType::ByteArray(len) => len.write_bytes(writer),
            CLType::Result { ok, err } => {
                ok.write_bytes(writer)?;
                err.write_bytes(writer)
            }
            CLType::Map { key, value } => {
                key.write_bytes(writer)?;
                value.write_bytes(writer)
            }
            CLType::Tuple1(types) => types.iter().try_for_each(|t| t.write_bytes(writer)),
            CLType::Tuple2(types) => types.iter().try_for_each(|t| t.write_bytes(writer)),
            CLType::Tuple3(types) => types.iter().try_for_each(|t| t.write_bytes(writer)),
            _ => Ok(()),
        }
    }
}

impl FromBytes for CLType {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        CLType::from_bytes_with_depth(bytes, 0)
    }
}

/// Rust types with a fixed [`CLType`].
pub trait CLTyped {
    fn cl_type() -> CLType;
}

macro_rules! impl_cl_typed {
    ($($type:ty => $cl_type:expr),* $(,)?) => {
        $(
            impl CLTyped for $type {
                fn cl_type() -> CLType {
                    $cl_type
                }
            }
        )*
    };
}

impl_cl_typed! {
    bool => CLType::Bool,
    i32 => CLType::I32,
    i64 => CLType::I64,
    u8 => CLType::U8,
    u32 => CLType::U32,
    u64 => CLType::U64,
    U512 => CLType::U512,
    () => CLType::Unit,
    String => CLType::String,
    PublicKey => CLType::PublicKey,
    [u8; 32] => CLType::ByteArray(32),
    AccountHash => CLType::ByteArray(32),
}

impl<T: CLTyped> CLTyped for Vec<T> {
    fn cl_type() -> CLType {
        CLType::List(Box::new(T::cl_type()))
    }
}

impl<T: CLTyped> CLTyped for Option<T> {
    fn cl_type() -> CLType {
        CLType::Option(Box::new(T::cl_type()))
    }
}

/// Errors converting between Rust values and [`CLValue`]s.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CLValueError {
    #[error("CLValue serialization error: {0}")]
    Serialization(#[from] bytesrepr::Error),
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    Type { expected: CLType, found: CLType },
}

/// A value of some [`CLType`], held in its serialized form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CLValue {
    cl_type: CLType,
    bytes: Bytes,
}

impl CLValue {
    /// Serializes `t` and records its type.
    pub fn from_t<T: CLTyped + ToBytes>(t: T) -> Result<CLValue, CLValueError> {
        let bytes = t.to_bytes()?;
        Ok(CLValue {
            cl_type: T::cl_type(),
            bytes: bytes.into(),
        })
    }

    /// Deserializes the value, failing if the type does not match `T`.
    pub fn into_t<T: CLTyped + FromBytes>(self) -> Result<T, CLValueError> {
        let expected = T::cl_type();
        if self.cl_type != expected {
            return Err(CLValueError::Type {
                expected,
                found: self.cl_type,
            });
        }
        Ok(bytesrepr::deserialize_from_slice(self.bytes.inner_bytes())?)
    }

    /// Builds a value from raw parts without checking that `bytes` fit `cl_type`.
    pub fn from_components(cl_type: CLType, bytes: Vec<u8>) -> Self {
        CLValue {
            cl_type,
            bytes: bytes.into(),
        }
    }

    pub fn unit() -> Self {
        CLValue::from_components(CLType::Unit, Vec::new())
    }

    pub fn cl_type(&self) -> &CLType {
        &self.cl_type
    }

    /// The serialized value, without length prefix or type.
    pub fn inner_bytes(&self) -> &Vec<u8> {
        self.bytes.inner_bytes()
    }

    /// Best-effort JSON rendering of the value, `None` for types without a natural JSON form.
    pub fn parsed(&self) -> Option<Value> {
        let (value, rem) = parse_json(&self.cl_type, self.bytes.inner_bytes()).ok()?;
        rem.is_empty().then_some(value)
    }
}

fn parse_json<'a>(cl_type: &CLType, bytes: &'a [u8]) -> Result<(Value, &'a [u8]), bytesrepr::Error> {
    fn map<'a, T, F: FnOnce(T) -> Value>(
        parsed: (T, &'a [u8]),
        f: F,
    ) -> Result<(Value, &'a [u8]), bytesrepr::Error> {
        Ok((f(parsed.0), parsed.1))
    }

    match cl_type {
        CLType::Bool => map(bool::from_bytes(bytes)?, Value::from),
        CLType::I32 => map(i32::from_bytes(bytes)?, Value::from),
        CLType::I64 => map(i64::from_bytes(bytes)?, Value::from),
        CLType::U8 => map(u8::from_bytes(bytes)?, Value::from),
        CLType::U32 => map(u32::from_bytes(bytes)?, Value::from),
        CLType::U64 => map(u64::from_bytes(bytes)?, Value::from),
        CLType::U512 => map(U512::from_bytes(bytes)?, |v| Value::from(v.to_string())),
        CLType::Unit => Ok((Value::Null, bytes)),
        CLType::String => map(String::from_bytes(bytes)?, Value::from),
        CLType::PublicKey => map(PublicKey::from_bytes(bytes)?, |key| Value::from(key.to_hex())),
        CLType::ByteArray(len) => {
            let (raw, rem) = bytesrepr::safe_split_at(bytes, *len as usize)?;
            Ok((Value::from(hex::encode(raw)), rem))
        }
        CLType::Option(inner) => {
            let (tag, rem) = u8::from_bytes(bytes)?;
            match tag {
                0 => Ok((Value::Null, rem)),
                1 => parse_json(inner, rem),
                _ => Err(bytesrepr::Error::Formatting),
            }
        }
        CLType::List(inner) => {
            let (count, mut rem) = u32::from_bytes(bytes)?;
            let mut items = Vec::with_capacity((count as usize).min(rem.len()));
            for _ in 0..count {
                let (item, next) = parse_json(inner, rem)?;
                items.push(item);
                rem = next;
            }
            Ok((Value::Array(items), rem))
        }
        _ => Err(bytesrepr::Error::Formatting),
    }
}

impl ToBytes for CLValue {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        self.bytes.serialized_length() + self.cl_type.serialized_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        self.bytes.write_bytes(writer)?;
        self.cl_type.write_bytes(writer)
    }
}

impl FromBytes for CLValue {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (bytes, rem) = Bytes::from_bytes(bytes)?;
        let (cl_type, rem) = CLType::from_bytes(rem)?;
        Ok((CLValue { cl_type, bytes }, rem))
    }
}

#[derive(Serialize, Deserialize)]
struct CLValueJson {
    cl_type: CLType,
    bytes: Bytes,
    #[serde(default)]
    parsed: Option<Value>,
}

impl Serialize for CLValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CLValueJson {
            cl_type: self.cl_type.clone(),
            bytes: self.bytes.clone(),
            parsed: self.parsed(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CLValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let CLValueJson { cl_type, bytes, .. } = CLValueJson::deserialize(deserializer)?;
        Ok(CLValue { cl_type, bytes })
    }
}
