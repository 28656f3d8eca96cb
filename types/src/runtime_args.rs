use serde::{Deserialize, Serialize};

use crate::{
    bytesrepr::{self, FromBytes, ToBytes},
    cl_value::{CLTyped, CLValue, CLValueError},
};

/// A named argument; JSON form is the pair `[name, value]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamedArg(String, CLValue);

impl NamedArg {
    pub fn new(name: String, value: CLValue) -> Self {
        NamedArg(name, value)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn cl_value(&self) -> &CLValue {
        &self.1
    }
}

impl ToBytes for NamedArg {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        self.0.serialized_length() + self.1.serialized_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        self.0.write_bytes(writer)?;
        self.1.write_bytes(writer)
    }
}

impl FromBytes for NamedArg {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (name, rem) = String::from_bytes(bytes)?;
        let (value, rem) = CLValue::from_bytes(rem)?;
        Ok((NamedArg(name, value), rem))
    }
}

/// Arguments passed to an entry point, in insertion order.
///
/// The order is part of the serialized form and therefore of the deploy hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuntimeArgs(Vec<NamedArg>);

impl RuntimeArgs {
    pub fn new() -> Self {
        RuntimeArgs::default()
    }

    /// Appends `value` under `name`.
    pub fn insert<K, V>(&mut self, name: K, value: V) -> Result<(), CLValueError>
    where
        K: Into<String>,
        V: CLTyped + ToBytes,
    {
        let cl_value = CLValue::from_t(value)?;
        self.0.push(NamedArg(name.into(), cl_value));
        Ok(())
    }

    /// Appends an already-encoded value under `name`.
    pub fn insert_cl_value<K: Into<String>>(&mut self, name: K, cl_value: CLValue) {
        self.0.push(NamedArg(name.into(), cl_value));
    }

    /// The first value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&CLValue> {
        self.0
            .iter()
            .find(|arg| arg.name() == name)
            .map(NamedArg::cl_value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn named_args(&self) -> impl Iterator<Item = &NamedArg> {
        self.0.iter()
    }
}

impl From<Vec<NamedArg>> for RuntimeArgs {
    fn from(args: Vec<NamedArg>) -> Self {
        RuntimeArgs(args)
    }
}

impl ToBytes for RuntimeArgs {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        self.0.to_bytes()
    }

    fn serialized_length(&self) -> usize {
        self.0.serialized_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        self.0.write_bytes(writer)
    }
}

impl FromBytes for RuntimeArgs {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (args, rem) = Vec::<NamedArg>::from_bytes(bytes)?;
        Ok((RuntimeArgs(args), rem))
    }
}

/// Builds [`RuntimeArgs`] from `name => value` pairs, returning
/// `Result<RuntimeArgs, CLValueError>`.
///
/// ```
/// use casper_deploy_types::{runtime_args, U512};
///
/// let args = runtime_args! { "amount" => U512::from(10), "id" => Some(1u64) }.unwrap();
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! runtime_args {
    () => {
        ::core::result::Result::<$crate::RuntimeArgs, $crate::CLValueError>::Ok(
            $crate::RuntimeArgs::new(),
        )
    };
    ( $($name:expr => $value:expr),+ $(,)? ) => {{
        let mut args = $crate::RuntimeArgs::new();
        let mut result = ::core::result::Result::Ok(());
        $(
            if result.is_ok() {
                result = args.insert($name, $value);
            }
        )+
        result.map(|()| args)
    }};
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::U512;

    #[test]
    fn should_preserve_insertion_order_in_bytes() {
        let forward = runtime_args! { "a" => 1u8, "b" => 2u8 }.unwrap();
        let backward = runtime_args! { "b" => 2u8, "a" => 1u8 }.unwrap();
        assert_ne!(forward.to_bytes().unwrap(), backward.to_bytes().unwrap());
        let names: Vec<_> = forward.named_args().map(NamedArg::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn should_encode_count_then_name_value_type() {
        let args = runtime_args! { "x" => 5u8 }.unwrap();
        assert_eq!(
            args.to_bytes().unwrap(),
            vec![1, 0, 0, 0, 1, 0, 0, 0, b'x', 1, 0, 0, 0, 5, 3]
        );
        assert_eq!(RuntimeArgs::new().to_bytes().unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn should_round_trip_through_bytes() {
        let args = runtime_args! {
            "amount" => U512::from(2_500_000_000u64),
            "id" => Some(9u64),
            "memo" => String::from("hi"),
            "none" => None::<u64>,
        }
        .unwrap();
        let bytes = args.to_bytes().unwrap();
        assert_eq!(bytes.len(), args.serialized_length());
        let parsed: RuntimeArgs = bytesrepr::deserialize_from_slice(bytes).unwrap();
        assert_eq!(parsed, args);
        assert_eq!(
            parsed.get("id").cloned().unwrap().into_t::<Option<u64>>().unwrap(),
            Some(9)
        );
        assert!(parsed.get("missing").is_none());
    }

    #[test]
    fn should_serialize_as_list_of_pairs() {
        let args = runtime_args! { "amount" => U512::from(1u64) }.unwrap();
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!([["amount", {"cl_type": "U512", "bytes": "0101", "parsed": "1"}]])
        );
    }
}
