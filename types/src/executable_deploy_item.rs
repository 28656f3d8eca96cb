use std::fmt::{self, Debug, Display, Formatter};

use serde::{de::Error as SerdeError, Deserialize, Deserializer, Serialize, Serializer};

#[cfg(any(feature = "testing", test))]
use rand::{
    distributions::{Alphanumeric, Distribution, Standard},
    Rng,
};

use crate::{
    account_hash::AccountHash,
    bytesrepr::{self, Bytes, FromBytes, ToBytes},
    cl_value::CLValueError,
    crypto::PublicKey,
    runtime_args::RuntimeArgs,
    Digest, U512,
};

const TAG_LENGTH: usize = 1;
const MODULE_BYTES_TAG: u8 = 0;
const STORED_CONTRACT_BY_HASH_TAG: u8 = 1;
const STORED_CONTRACT_BY_NAME_TAG: u8 = 2;
const STORED_VERSIONED_CONTRACT_BY_HASH_TAG: u8 = 3;
const STORED_VERSIONED_CONTRACT_BY_NAME_TAG: u8 = 4;
const TRANSFER_TAG: u8 = 5;

/// Name of the payment amount argument of standard payment code.
pub const STANDARD_PAYMENT_ARG_AMOUNT: &str = "amount";
/// Name of the amount argument of a native transfer.
pub const TRANSFER_ARG_AMOUNT: &str = "amount";
/// Name of the target argument of a native transfer.
pub const TRANSFER_ARG_TARGET: &str = "target";
/// Name of the id argument of a native transfer.
pub const TRANSFER_ARG_ID: &str = "id";

/// Version of a contract within a contract package.
pub type ContractVersion = u32;

macro_rules! hash_newtype {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; Digest::LENGTH]);

        impl $name {
            pub const fn new(value: [u8; Digest::LENGTH]) -> Self {
                $name(value)
            }

            pub fn value(&self) -> [u8; Digest::LENGTH] {
                self.0
            }

            pub fn from_hex(input: &str) -> Result<Self, crate::DigestParseError> {
                Digest::from_hex(input).map(|digest| $name(digest.value()))
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl ToBytes for $name {
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

        impl FromBytes for $name {
            fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
                let (raw, rem) = <[u8; Digest::LENGTH]>::from_bytes(bytes)?;
                Ok(($name(raw), rem))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                hex::encode(self.0).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let hex_string = String::deserialize(deserializer)?;
                $name::from_hex(&hex_string).map_err(SerdeError::custom)
            }
        }
    };
}

hash_newtype!(
    /// Address of a stored contract.
    ContractHash
);
hash_newtype!(
    /// Address of a stored contract package, which holds every version of a contract.
    ContractPackageHash
);

/// The recipient of a native transfer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferTarget {
    PublicKey(PublicKey),
    AccountHash(AccountHash),
}

impl From<PublicKey> for TransferTarget {
    fn from(public_key: PublicKey) -> Self {
        TransferTarget::PublicKey(public_key)
    }
}

impl From<AccountHash> for TransferTarget {
    fn from(account_hash: AccountHash) -> Self {
        TransferTarget::AccountHash(account_hash)
    }
}

/// The payment or session code of a [`Deploy`](crate::Deploy).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub enum ExecutableDeployItem {
    /// Raw bytes of compiled Wasm code, which must include a `call` entry point, and the arguments
    /// to call at runtime.
    ModuleBytes {
        /// The compiled Wasm bytes.
        module_bytes: Bytes,
        /// The arguments to be passed to the entry point at runtime.
        args: RuntimeArgs,
    },
    /// A contract stored in global state, referenced by its "hash", along with the entry point and
    /// arguments to call at runtime.
    StoredContractByHash {
        /// The contract's identifier.
        hash: ContractHash,
        /// The contract's entry point to be called at runtime.
        entry_point: String,
        /// The arguments to be passed to the entry point at runtime.
        args: RuntimeArgs,
    },
    /// A contract stored in global state, referenced by a named key existing in the `Deploy`'s
    /// account context, along with the entry point and arguments to call at runtime.
    StoredContractByName {
        /// The name of the named key under which the contract is referenced.
        name: String,
        /// The contract's entry point to be called at runtime.
        entry_point: String,
        /// The arguments to be passed to the entry point at runtime.
        args: RuntimeArgs,
    },
    /// A versioned contract stored in global state, referenced by its "hash", along with the entry
    /// point and arguments to call at runtime.
    StoredVersionedContractByHash {
        /// The contract package's identifier.
        hash: ContractPackageHash,
        /// The version of the contract to call.  If `None`, the highest enabled version is used.
        version: Option<ContractVersion>,
        /// The contract's entry point to be called at runtime.
        entry_point: String,
        /// The arguments to be passed to the entry point at runtime.
        args: RuntimeArgs,
    },
    /// A versioned contract stored in global state, referenced by a named key existing in the
    /// `Deploy`'s account context, along with the entry point and arguments to call at runtime.
    StoredVersionedContractByName {
        /// The name of the named key under which the contract package is referenced.
        name: String,
        /// The version of the contract to call.  If `None`, the highest enabled version is used.
        version: Option<ContractVersion>,
        /// The contract's entry point to be called at runtime.
        entry_point: String,
        /// The arguments to be passed to the entry point at runtime.
        args: RuntimeArgs,
    },
    /// A native transfer which does not contain or reference any Wasm code.
    Transfer {
        /// The arguments to be passed to the native transfer entry point at runtime.
        args: RuntimeArgs,
    },
}

impl ExecutableDeployItem {
    /// Returns a new `ExecutableDeployItem::ModuleBytes`.
    pub fn new_module_bytes(module_bytes: Bytes, args: RuntimeArgs) -> Self {
        ExecutableDeployItem::ModuleBytes { module_bytes, args }
    }

    /// Returns a new `ExecutableDeployItem::ModuleBytes` suitable for use as standard payment code
    /// of a `Deploy`.
    pub fn new_standard_payment<A: Into<U512>>(amount: A) -> Result<Self, CLValueError> {
        let mut args = RuntimeArgs::new();
        args.insert(STANDARD_PAYMENT_ARG_AMOUNT, amount.into())?;
        Ok(ExecutableDeployItem::ModuleBytes {
            module_bytes: Bytes::new(),
            args,
        })
    }

    /// Returns a new `ExecutableDeployItem::StoredContractByHash`.
    pub fn new_stored_contract_by_hash(
        hash: ContractHash,
        entry_point: String,
        args: RuntimeArgs,
    ) -> Self {
        ExecutableDeployItem::StoredContractByHash {
            hash,
            entry_point,
            args,
        }
    }

    /// Returns a new `ExecutableDeployItem::StoredContractByName`.
    pub fn new_stored_contract_by_name(
        name: String,
        entry_point: String,
        args: RuntimeArgs,
    ) -> Self {
        ExecutableDeployItem::StoredContractByName {
            name,
            entry_point,
            args,
        }
    }

    /// Returns a new `ExecutableDeployItem::StoredVersionedContractByHash`.
    pub fn new_stored_versioned_contract_by_hash(
        hash: ContractPackageHash,
        version: Option<ContractVersion>,
        entry_point: String,
        args: RuntimeArgs,
    ) -> Self {
        ExecutableDeployItem::StoredVersionedContractByHash {
            hash,
            version,
            entry_point,
            args,
        }
    }

    /// Returns a new `ExecutableDeployItem::StoredVersionedContractByName`.
    pub fn new_stored_versioned_contract_by_name(
        name: String,
        version: Option<ContractVersion>,
        entry_point: String,
        args: RuntimeArgs,
    ) -> Self {
        ExecutableDeployItem::StoredVersionedContractByName {
            name,
            version,
            entry_point,
            args,
        }
    }

    /// Returns a new `ExecutableDeployItem` suitable for use as session code for a transfer.
    ///
    /// The arguments are `amount`, `target` and `id`, in that order. The id is always present as
    /// an optional value, so `None` is encoded explicitly.
    pub fn new_transfer<A: Into<U512>>(
        amount: A,
        target: TransferTarget,
        maybe_transfer_id: Option<u64>,
    ) -> Result<Self, CLValueError> {
        let mut args = RuntimeArgs::new();
        args.insert(TRANSFER_ARG_AMOUNT, amount.into())?;
        match target {
            TransferTarget::PublicKey(public_key) => args.insert(TRANSFER_ARG_TARGET, public_key)?,
            TransferTarget::AccountHash(account_hash) => {
                args.insert(TRANSFER_ARG_TARGET, account_hash)?
            }
        }
        args.insert(TRANSFER_ARG_ID, maybe_transfer_id)?;
        Ok(ExecutableDeployItem::Transfer { args })
    }

    /// Returns the runtime arguments.
    pub fn args(&self) -> &RuntimeArgs {
        match self {
            ExecutableDeployItem::ModuleBytes { args, .. }
            | ExecutableDeployItem::StoredContractByHash { args, .. }
            | ExecutableDeployItem::StoredContractByName { args, .. }
            | ExecutableDeployItem::StoredVersionedContractByHash { args, .. }
            | ExecutableDeployItem::StoredVersionedContractByName { args, .. }
            | ExecutableDeployItem::Transfer { args } => args,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, ExecutableDeployItem::Transfer { .. })
    }

    fn tag(&self) -> u8 {
        match self {
            ExecutableDeployItem::ModuleBytes { .. } => MODULE_BYTES_TAG,
            ExecutableDeployItem::StoredContractByHash { .. } => STORED_CONTRACT_BY_HASH_TAG,
            ExecutableDeployItem::StoredContractByName { .. } => STORED_CONTRACT_BY_NAME_TAG,
            ExecutableDeployItem::StoredVersionedContractByHash { .. } => {
                STORED_VERSIONED_CONTRACT_BY_HASH_TAG
            }
            ExecutableDeployItem::StoredVersionedContractByName { .. } => {
                STORED_VERSIONED_CONTRACT_BY_NAME_TAG
            }
            ExecutableDeployItem::Transfer { .. } => TRANSFER_TAG,
        }
    }
}

impl Display for ExecutableDeployItem {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExecutableDeployItem::ModuleBytes { module_bytes, .. } => {
                write!(formatter, "module-bytes [{} bytes]", module_bytes.len())
            }
            ExecutableDeployItem::StoredContractByHash {
                hash, entry_point, ..
            } => write!(formatter, "stored-contract-by-hash: {}, entry-point: {}", hash, entry_point),
            ExecutableDeployItem::StoredContractByName {
                name, entry_point, ..
            } => write!(formatter, "stored-contract-by-name: {}, entry-point: {}", name, entry_point),
            ExecutableDeployItem::StoredVersionedContractByHash {
                hash,
                version: Some(ver),
                entry_point,
                ..
            } => write!(
                formatter,
                "stored-versioned-contract-by-hash: {}, version: {}, entry-point: {}",
                hash, ver, entry_point,
            ),
            ExecutableDeployItem::StoredVersionedContractByHash {
                hash, entry_point, ..
            } => write!(
                formatter,
                "stored-versioned-contract-by-hash: {}, version: latest, entry-point: {}",
                hash, entry_point,
            ),
            ExecutableDeployItem::StoredVersionedContractByName {
                name,
                version: Some(ver),
                entry_point,
                ..
            } => write!(
                formatter,
                "stored-versioned-contract: {}, version: {}, entry-point: {}",
                name, ver, entry_point,
            ),
            ExecutableDeployItem::StoredVersionedContractByName {
                name, entry_point, ..
            } => write!(
                formatter,
                "stored-versioned-contract: {}, version: latest, entry-point: {}",
                name, entry_point,
            ),
            ExecutableDeployItem::Transfer { .. } => write!(formatter, "transfer"),
        }
    }
}

impl ToBytes for ExecutableDeployItem {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        TAG_LENGTH
            + match self {
                ExecutableDeployItem::ModuleBytes { module_bytes, args } => {
                    module_bytes.serialized_length() + args.serialized_length()
                }
                ExecutableDeployItem::StoredContractByHash {
                    hash,
                    entry_point,
                    args,
                } => {
                    hash.serialized_length()
                        + entry_point.serialized_length()
                        + args.serialized_length()
                }
                ExecutableDeployItem::StoredContractByName {
                    name,
                    entry_point,
                    args,
                } => {
                    name.serialized_length()
                        + entry_point.serialized_length()
                        + args.serialized_length()
                }
                ExecutableDeployItem::StoredVersionedContractByHash {
                    hash,
                    version,
                    entry_point,
                    args,
                } => {
                    hash.serialized_length()
                        + version.serialized_length()
                        + entry_point.serialized_length()
                        + args.serialized_length()
                }
                ExecutableDeployItem::StoredVersionedContractByName {
                    name,
                    version,
                    entry_point,
                    args,
                } => {
                    name.serialized_length()
                        + version.serialized_length()
                        + entry_point.serialized_length()
                        + args.serialized_length()
                }
                ExecutableDeployItem::Transfer { args } => args.serialized_length(),
            }
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        writer.push(self.tag());
        match self {
            ExecutableDeployItem::ModuleBytes { module_bytes, args } => {
                module_bytes.write_bytes(writer)?;
                args.write_bytes(writer)
            }
            ExecutableDeployItem::StoredContractByHash {
                hash,
                entry_point,
                args,
            } => {
                hash.write_bytes(writer)?;
                entry_point.write_bytes(writer)?;
                args.write_bytes(writer)
            }
            ExecutableDeployItem::StoredContractByName {
                name,
                entry_point,
                args,
            } => {
                name.write_bytes(writer)?;
                entry_point.write_bytes(writer)?;
                args.write_bytes(writer)
            }
            ExecutableDeployItem::StoredVersionedContractByHash {
                hash,
                version,
                entry_point,
                args,
            } => {
                hash.write_bytes(writer)?;
                version.write_bytes(writer)?;
                entry_point.write_bytes(writer)?;
                args.write_bytes(writer)
            }
            ExecutableDeployItem::StoredVersionedContractByName {
                name,
                version,
                entry_point,
                args,
            } => {
                name.write_bytes(writer)?;
                version.write_bytes(writer)?;
                entry_point.write_bytes(writer)?;
                args.write_bytes(writer)
            }
            ExecutableDeployItem::Transfer { args } => args.write_bytes(writer),
        }
    }
}

impl FromBytes for ExecutableDeployItem {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (tag, remainder) = u8::from_bytes(bytes)?;
        match tag {
            MODULE_BYTES_TAG => {
                let (module_bytes, remainder) = Bytes::from_bytes(remainder)?;
                let (args, remainder) = RuntimeArgs::from_bytes(remainder)?;
                Ok((ExecutableDeployItem::ModuleBytes { module_bytes, args }, remainder))
            }
            STORED_CONTRACT_BY_HASH_TAG => {
                let (hash, remainder) = ContractHash::from_bytes(remainder)?;
                let (entry_point, remainder) = String::from_bytes(remainder)?;
                let (args, remainder) = RuntimeArgs::from_bytes(remainder)?;
                Ok((
                    ExecutableDeployItem::StoredContractByHash {
                        hash,
                        entry_point,
                        args,
                    },
                    remainder,
                ))
            }
            STORED_CONTRACT_BY_NAME_TAG => {
                let (name, remainder) = String::from_bytes(remainder)?;
                let (entry_point, remainder) = String::from_bytes(remainder)?;
                let (args, remainder) = RuntimeArgs::from_bytes(remainder)?;
                Ok((
                    ExecutableDeployItem::StoredContractByName {
                        name,
                        entry_point,
                        args,
                    },
                    remainder,
                ))
            }
            STORED_VERSIONED_CONTRACT_BY_HASH_TAG => {
                let (hash, remainder) = ContractPackageHash::from_bytes(remainder)?;
                let (version, remainder) = Option::<ContractVersion>::from_bytes(remainder)?;
                let (entry_point, remainder) = String::from_bytes(remainder)?;
                let (args, remainder) = RuntimeArgs::from_bytes(remainder)?;
                Ok((
                    ExecutableDeployItem::StoredVersionedContractByHash {
                        hash,
                        version,
                        entry_point,
                        args,
                    },
                    remainder,
                ))
            }
            STORED_VERSIONED_CONTRACT_BY_NAME_TAG => {
                let (name, remainder) = String::from_bytes(remainder)?;
                let (version, remainder) = Option::<ContractVersion>::from_bytes(remainder)?;
                let (entry_point, remainder) = String::from_bytes(remainder)?;
                let (args, remainder) = RuntimeArgs::from_bytes(remainder)?;
                Ok((
                    ExecutableDeployItem::StoredVersionedContractByName {
                        name,
                        version,
                        entry_point,
                        args,
                    },
                    remainder,
                ))
            }
            TRANSFER_TAG => {
                let (args, remainder) = RuntimeArgs::from_bytes(remainder)?;
                Ok((ExecutableDeployItem::Transfer { args }, remainder))
            }
            _ => Err(bytesrepr::Error::Formatting),
        }
    }
}

#[cfg(any(feature = "testing", test))]
impl Distribution<ExecutableDeployItem> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ExecutableDeployItem {
        fn random_bytes<R: Rng + ?Sized>(rng: &mut R) -> Vec<u8> {
            let mut bytes = vec![0u8; rng.gen_range(0..100)];
            rng.fill_bytes(bytes.as_mut());
            bytes
        }

        fn random_string<R: Rng + ?Sized>(rng: &mut R) -> String {
            rng.sample_iter(&Alphanumeric)
                .take(20)
                .map(char::from)
                .collect()
        }

        let mut args = RuntimeArgs::new();
        args.insert_cl_value(
            random_string(rng),
            crate::CLValue::from_components(
                crate::CLType::List(Box::new(crate::CLType::U8)),
                Bytes::from(random_bytes(rng)).to_bytes().unwrap_or_default(),
            ),
        );

        match rng.gen_range(0..6) {
            0 => ExecutableDeployItem::ModuleBytes {
                module_bytes: random_bytes(rng).into(),
                args,
            },
            1 => ExecutableDeployItem::StoredContractByHash {
                hash: ContractHash::new(rng.gen()),
                entry_point: random_string(rng),
                args,
            },
            2 => ExecutableDeployItem::StoredContractByName {
                name: random_string(rng),
                entry_point: random_string(rng),
                args,
            },
            3 => ExecutableDeployItem::StoredVersionedContractByHash {
                hash: ContractPackageHash::new(rng.gen()),
                version: rng.gen(),
                entry_point: random_string(rng),
                args,
            },
            4 => ExecutableDeployItem::StoredVersionedContractByName {
                name: random_string(rng),
                version: rng.gen(),
                entry_point: random_string(rng),
                args,
            },
            _ => {
                let mut transfer_args = RuntimeArgs::new();
                transfer_args.insert_cl_value(
                    TRANSFER_ARG_AMOUNT,
                    crate::CLValue::from_components(
                        crate::CLType::U512,
                        U512::from(rng.gen::<u64>()).to_bytes().unwrap_or_default(),
                    ),
                );
                ExecutableDeployItem::Transfer {
                    args: transfer_args,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::runtime_args;

    #[test]
    fn should_lay_out_standard_payment() {
        let payment = ExecutableDeployItem::new_standard_payment(2_500_000_000u64).unwrap();
        let mut expected = vec![MODULE_BYTES_TAG, 0, 0, 0, 0];
        expected.extend_from_slice(&[1, 0, 0, 0]);
        expected.extend_from_slice(&[6, 0, 0, 0]);
        expected.extend_from_slice(b"amount");
        expected.extend_from_slice(&[5, 0, 0, 0, 4, 0x00, 0xf9, 0x02, 0x95, 8]);
        assert_eq!(payment.to_bytes().unwrap(), expected);
    }

    #[test]
    fn should_write_transfer_args_in_fixed_order() {
        let target = PublicKey::Ed25519([2; 32]);
        let transfer =
            ExecutableDeployItem::new_transfer(10u64, TransferTarget::PublicKey(target), None)
                .unwrap();
        let names: Vec<_> = transfer.args().named_args().map(|arg| arg.name()).collect();
        assert_eq!(names, vec!["amount", "target", "id"]);
        let id = transfer.args().get(TRANSFER_ARG_ID).unwrap();
        assert_eq!(
            id.to_bytes().unwrap(),
            vec![1, 0, 0, 0, 0, 13, 5],
            "absent id is an explicit None"
        );
        assert!(transfer.is_transfer());

        let by_hash = ExecutableDeployItem::new_transfer(
            10u64,
            AccountHash::new([4; 32]).into(),
            Some(1),
        )
        .unwrap();
        let target = by_hash.args().get(TRANSFER_ARG_TARGET).unwrap();
        assert_eq!(target.cl_type(), &crate::CLType::ByteArray(32));
    }

    #[test]
    fn should_write_contract_hash_raw_and_version_as_option() {
        let item = ExecutableDeployItem::new_stored_versioned_contract_by_hash(
            ContractPackageHash::new([7; 32]),
            Some(3),
            "call".to_string(),
            RuntimeArgs::new(),
        );
        let bytes = item.to_bytes().unwrap();
        assert_eq!(bytes[0], STORED_VERSIONED_CONTRACT_BY_HASH_TAG);
        assert_eq!(&bytes[1..33], &[7; 32]);
        assert_eq!(&bytes[33..38], &[1, 3, 0, 0, 0]);
        assert_eq!(&bytes[38..42], &[4, 0, 0, 0]);
        assert_eq!(&bytes[42..46], b"call");
        assert_eq!(&bytes[46..], &[0, 0, 0, 0]);
    }

    #[test]
    fn should_round_trip_every_variant() {
        let args = runtime_args! { "x" => 1u32, "y" => String::from("z") }.unwrap();
        let items = vec![
            ExecutableDeployItem::new_module_bytes(Bytes::from(vec![0, 97, 115, 109]), args.clone()),
            ExecutableDeployItem::new_stored_contract_by_hash(
                ContractHash::new([1; 32]),
                "ep".to_string(),
                args.clone(),
            ),
            ExecutableDeployItem::new_stored_contract_by_name(
                "named".to_string(),
                "ep".to_string(),
                args.clone(),
            ),
            ExecutableDeployItem::new_stored_versioned_contract_by_hash(
                ContractPackageHash::new([2; 32]),
                None,
                "ep".to_string(),
                args.clone(),
            ),
            ExecutableDeployItem::new_stored_versioned_contract_by_name(
                "pkg".to_string(),
                Some(9),
                "ep".to_string(),
                args.clone(),
            ),
            ExecutableDeployItem::Transfer { args },
        ];
        for item in items {
            let bytes = item.to_bytes().unwrap();
            assert_eq!(bytes.len(), item.serialized_length());
            let parsed: ExecutableDeployItem = bytesrepr::deserialize_from_slice(&bytes).unwrap();
            assert_eq!(parsed, item);
        }
    }

    #[test]
    fn should_round_trip_random_items() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let item: ExecutableDeployItem = rng.gen();
            let parsed: ExecutableDeployItem =
                bytesrepr::deserialize_from_slice(item.to_bytes().unwrap()).unwrap();
            assert_eq!(parsed, item);
        }
    }

    #[test]
    fn should_reject_unknown_tag() {
        assert_eq!(
            ExecutableDeployItem::from_bytes(&[6, 0, 0, 0, 0]),
            Err(bytesrepr::Error::Formatting)
        );
    }

    #[test]
    fn should_tag_json_by_variant_name() {
        let item = ExecutableDeployItem::new_stored_contract_by_hash(
            ContractHash::new([0xab; 32]),
            "transfer".to_string(),
            RuntimeArgs::new(),
        );
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            json!({"StoredContractByHash": {
                "hash": "ab".repeat(32),
                "entry_point": "transfer",
                "args": []
            }})
        );
        let parsed: ExecutableDeployItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }
}
