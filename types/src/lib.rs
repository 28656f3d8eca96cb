//! Types for building, hashing and signing deploys for the Casper network.
//!
//! Everything that goes into a deploy hash implements [`bytesrepr::ToBytes`], and the bytes it
//! produces are the ones the network recomputes when it checks the hash.

#![deny(clippy::complexity)]
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]

mod account_hash;
pub mod bytesrepr;
mod cl_value;
mod crypto;
mod deploy;
mod deploy_builder;
mod digest;
mod executable_deploy_item;
mod runtime_args;
pub mod signer;
#[cfg(any(feature = "testing", test))]
pub mod testing;
mod timestamp;
mod u512;
mod validation;

pub use account_hash::{AccountHash, AccountHashParseError};
pub use cl_value::{CLType, CLTyped, CLValue, CLValueError};
pub use crypto::{
    KeyAlgorithm, KeyError, PublicKey, Signature, VerificationError, ED25519_PUBLIC_KEY_LENGTH,
    SECP256K1_PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
};
pub use deploy::{
    Approval, Deploy, DeployHash, DeployHeader, DeployValidationFailure, MAX_DEPENDENCIES,
    MAX_SERIALIZED_SIZE_OF_DEPLOY,
};
pub use deploy_builder::{DeployBuilder, DeployConfig, DEFAULT_CHAIN_NAME};
pub use digest::{Digest, DigestParseError};
pub use executable_deploy_item::{
    ContractHash, ContractPackageHash, ContractVersion, ExecutableDeployItem, TransferTarget,
    STANDARD_PAYMENT_ARG_AMOUNT, TRANSFER_ARG_AMOUNT, TRANSFER_ARG_ID, TRANSFER_ARG_TARGET,
};
pub use runtime_args::{NamedArg, RuntimeArgs};
pub use signer::{
    DeploySigner, DuplicateSignerPolicy, Ed25519KeyPair, Secp256k1KeyPair, SignerConfig,
    SigningError, SigningProvider,
};
pub use timestamp::{TimeDiff, Timestamp};
pub use u512::{cspr_to_motes, parse_motes, MOTES_PER_CSPR, U512};
pub use validation::ValidationError;
