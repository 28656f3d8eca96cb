use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    bytesrepr::{self, FromBytes, ToBytes},
    crypto::{PublicKey, Signature, VerificationError},
    executable_deploy_item::ExecutableDeployItem,
    Digest, DigestParseError, TimeDiff, Timestamp,
};

/// The maximum permissible size in bytes of a Deploy when serialized via `ToBytes`.
///
/// Note: this should be kept in sync with the value of `[deploys.max_deploy_size]` in the
/// production chainspec.
pub const MAX_SERIALIZED_SIZE_OF_DEPLOY: u32 = 1_024 * 1_024;

/// The maximum number of dependencies a deploy may declare.
pub const MAX_DEPENDENCIES: u8 = 10;

/// A representation of the way in which a deploy failed validation checks.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Error, Serialize)]
pub enum DeployValidationFailure {
    /// The provided body hash does not match the actual hash of the body.
    #[error("the provided body hash does not match the actual hash of the body")]
    InvalidBodyHash,

    /// The provided deploy hash does not match the actual hash of the deploy.
    #[error("the provided hash does not match the actual hash of the deploy")]
    InvalidDeployHash,

    /// The deploy has no approvals.
    #[error("the deploy has no approvals")]
    EmptyApprovals,

    /// Invalid approval.
    #[error("the approval at index {index} is invalid: {error_msg}")]
    InvalidApproval {
        /// The index of the approval at fault.
        index: usize,
        /// The approval validation error.
        error_msg: String,
    },

    /// The deploy could not be re-serialized for checking.
    #[error("failed to serialize deploy: {0}")]
    Serialization(String),
}

/// A cryptographic hash uniquely identifying a [`Deploy`].
#[derive(
    Copy, Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug,
)]
#[serde(deny_unknown_fields)]
pub struct DeployHash(Digest);

impl DeployHash {
    /// Returns a new `DeployHash`.
    pub fn new(digest: Digest) -> Self {
        DeployHash(digest)
    }

    /// Returns a copy of the wrapped `Digest`.
    pub fn inner(&self) -> Digest {
        self.0
    }

    pub fn from_hex(input: &str) -> Result<Self, DigestParseError> {
        Digest::from_hex(input).map(DeployHash)
    }
}

impl From<Digest> for DeployHash {
    fn from(digest: Digest) -> Self {
        Self(digest)
    }
}

impl From<DeployHash> for Digest {
    fn from(deploy_hash: DeployHash) -> Self {
        deploy_hash.0
    }
}

impl Display for DeployHash {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for DeployHash {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeployHash::from_hex(s)
    }
}

impl ToBytes for DeployHash {
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

impl FromBytes for DeployHash {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        Digest::from_bytes(bytes).map(|(digest, rem)| (DeployHash(digest), rem))
    }
}

impl AsRef<[u8]> for DeployHash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// The header portion of a [`Deploy`].
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct DeployHeader {
    account: PublicKey,
    timestamp: Timestamp,
    ttl: TimeDiff,
    gas_price: u64,
    body_hash: Digest,
    dependencies: Vec<DeployHash>,
    chain_name: String,
}

impl DeployHeader {
    pub(crate) fn new(
        account: PublicKey,
        timestamp: Timestamp,
        ttl: TimeDiff,
        gas_price: u64,
        body_hash: Digest,
        dependencies: Vec<DeployHash>,
        chain_name: String,
    ) -> Self {
        DeployHeader {
            account,
            timestamp,
            ttl,
            gas_price,
            body_hash,
            dependencies,
            chain_name,
        }
    }

    /// Returns the account within which the deploy will be run.
    pub fn account(&self) -> &PublicKey {
        &self.account
    }

    /// Returns the deploy creation timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns the duration for which the deploy will stay valid.
    pub fn ttl(&self) -> TimeDiff {
        self.ttl
    }

    /// Returns the price per gas unit for this deploy.
    pub fn gas_price(&self) -> u64 {
        self.gas_price
    }

    /// Returns the hash of the body of this deploy.
    pub fn body_hash(&self) -> Digest {
        self.body_hash
    }

    /// Other deploys that have to be run before this one.
    pub fn dependencies(&self) -> &Vec<DeployHash> {
        &self.dependencies
    }

    /// Returns the chain name of the network the deploy is supposed to be run on.
    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    /// Returns the point in time at which the deploy expires.
    pub fn expires(&self) -> Timestamp {
        self.timestamp + self.ttl
    }

    pub(crate) fn compute_hash(&self) -> Result<DeployHash, bytesrepr::Error> {
        Ok(DeployHash::new(Digest::hash(self.to_bytes()?)))
    }
}

impl Display for DeployHeader {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(
            formatter,
            "deploy header {{ account {}, timestamp {}, ttl {}, body hash {}, chain name {} }}",
            self.account, self.timestamp, self.ttl, self.body_hash, self.chain_name,
        )
    }
}

impl ToBytes for DeployHeader {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        self.account.serialized_length()
            + self.timestamp.serialized_length()
            + self.ttl.serialized_length()
            + self.gas_price.serialized_length()
            + self.body_hash.serialized_length()
            + self.dependencies.serialized_length()
            + self.chain_name.serialized_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        self.account.write_bytes(writer)?;
        self.timestamp.write_bytes(writer)?;
        self.ttl.write_bytes(writer)?;
        self.gas_price.write_bytes(writer)?;
        self.body_hash.write_bytes(writer)?;
        self.dependencies.write_bytes(writer)?;
        self.chain_name.write_bytes(writer)
    }
}

impl FromBytes for DeployHeader {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (account, remainder) = PublicKey::from_bytes(bytes)?;
        let (timestamp, remainder) = Timestamp::from_bytes(remainder)?;
        let (ttl, remainder) = TimeDiff::from_bytes(remainder)?;
        let (gas_price, remainder) = u64::from_bytes(remainder)?;
        let (body_hash, remainder) = Digest::from_bytes(remainder)?;
        let (dependencies, remainder) = Vec::<DeployHash>::from_bytes(remainder)?;
        let (chain_name, remainder) = String::from_bytes(remainder)?;
        let header = DeployHeader {
            account,
            timestamp,
            ttl,
            gas_price,
            body_hash,
            dependencies,
            chain_name,
        };
        Ok((header, remainder))
    }
}

/// The signature of a deploy and the public key of the signer.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Approval {
    signer: PublicKey,
    signature: Signature,
}

impl Approval {
    pub fn new(signer: PublicKey, signature: Signature) -> Self {
        Self { signer, signature }
    }

    /// Returns the public key.
    pub fn signer(&self) -> &PublicKey {
        &self.signer
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Checks the signature over the raw bytes of `hash`.
    pub fn verify(&self, hash: &DeployHash) -> Result<(), VerificationError> {
        self.signer.verify(hash, &self.signature)
    }
}

impl ToBytes for Approval {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        self.signer.serialized_length() + self.signature.serialized_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        self.signer.write_bytes(writer)?;
        self.signature.write_bytes(writer)
    }
}

impl FromBytes for Approval {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (signer, remainder) = PublicKey::from_bytes(bytes)?;
        let (signature, remainder) = Signature::from_bytes(remainder)?;
        Ok((Approval { signer, signature }, remainder))
    }
}

/// A signed item sent to the network used to request execution of Wasm.
///
/// Note that constructing a `Deploy` is done via the [`DeployBuilder`](crate::DeployBuilder),
/// and approvals are added by a [`DeploySigner`](crate::DeploySigner). Nothing can change the
/// header, payment or session of an existing deploy.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Deploy {
    hash: DeployHash,
    header: DeployHeader,
    payment: ExecutableDeployItem,
    session: ExecutableDeployItem,
    approvals: Vec<Approval>,
}

impl Deploy {
    /// The default time-to-live for `Deploy`s, i.e. 30 minutes.
    pub const DEFAULT_TTL: TimeDiff = TimeDiff::from_millis(30 * 60 * 1_000);
    /// The default gas price for `Deploy`s, i.e. `1`.
    pub const DEFAULT_GAS_PRICE: u64 = 1;
    /// The longest time-to-live the network accepts, i.e. 1 day.
    pub const MAX_TTL: TimeDiff = TimeDiff::from_millis(24 * 60 * 60 * 1_000);

    /// Assembles an unsigned deploy. Callers guarantee `hash` and `header.body_hash` were
    /// computed from the other parts.
    pub(crate) fn from_parts(
        hash: DeployHash,
        header: DeployHeader,
        payment: ExecutableDeployItem,
        session: ExecutableDeployItem,
    ) -> Self {
        Deploy {
            hash,
            header,
            payment,
            session,
            approvals: Vec::new(),
        }
    }

    /// Returns the hash uniquely identifying this deploy.
    pub fn hash(&self) -> &DeployHash {
        &self.hash
    }

    /// Returns the header portion of the deploy.
    pub fn header(&self) -> &DeployHeader {
        &self.header
    }

    /// Returns the payment code of the deploy.
    pub fn payment(&self) -> &ExecutableDeployItem {
        &self.payment
    }

    /// Returns the session code of the deploy.
    pub fn session(&self) -> &ExecutableDeployItem {
        &self.session
    }

    /// Returns the approvals, in the order they were added.
    pub fn approvals(&self) -> &[Approval] {
        &self.approvals
    }

    pub(crate) fn approvals_mut(&mut self) -> &mut Vec<Approval> {
        &mut self.approvals
    }

    /// Recomputes both hashes and verifies every approval.
    pub fn is_valid(&self) -> Result<(), DeployValidationFailure> {
        let serialization = |error: bytesrepr::Error| {
            DeployValidationFailure::Serialization(error.to_string())
        };
        let body_hash = serialize_body(&self.payment, &self.session)
            .map(Digest::hash)
            .map_err(serialization)?;
        if body_hash != self.header.body_hash {
            return Err(DeployValidationFailure::InvalidBodyHash);
        }

        let hash = self.header.compute_hash().map_err(serialization)?;
        if hash != self.hash {
            return Err(DeployValidationFailure::InvalidDeployHash);
        }

        if self.approvals.is_empty() {
            return Err(DeployValidationFailure::EmptyApprovals);
        }

        for (index, approval) in self.approvals.iter().enumerate() {
            if let Err(error) = approval.verify(&self.hash) {
                return Err(DeployValidationFailure::InvalidApproval {
                    index,
                    error_msg: error.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Display for Deploy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "deploy {{ {}, account {}, timestamp {}, ttl {}, body hash {}, chain name {} }}",
            self.hash,
            self.header.account,
            self.header.timestamp,
            self.header.ttl,
            self.header.body_hash,
            self.header.chain_name
        )
    }
}

impl ToBytes for Deploy {
    fn to_bytes(&self) -> Result<Vec<u8>, bytesrepr::Error> {
        let mut buffer = bytesrepr::allocate_buffer(self)?;
        self.write_bytes(&mut buffer)?;
        Ok(buffer)
    }

    fn serialized_length(&self) -> usize {
        self.header.serialized_length()
            + self.hash.serialized_length()
            + self.payment.serialized_length()
            + self.session.serialized_length()
            + self.approvals.serialized_length()
    }

    fn write_bytes(&self, writer: &mut Vec<u8>) -> Result<(), bytesrepr::Error> {
        self.header.write_bytes(writer)?;
        self.hash.write_bytes(writer)?;
        self.payment.write_bytes(writer)?;
        self.session.write_bytes(writer)?;
        self.approvals.write_bytes(writer)
    }
}

impl FromBytes for Deploy {
    fn from_bytes(bytes: &[u8]) -> Result<(Self, &[u8]), bytesrepr::Error> {
        let (header, remainder) = DeployHeader::from_bytes(bytes)?;
        let (hash, remainder) = DeployHash::from_bytes(remainder)?;
        let (payment, remainder) = ExecutableDeployItem::from_bytes(remainder)?;
        let (session, remainder) = ExecutableDeployItem::from_bytes(remainder)?;
        let (approvals, remainder) = Vec::<Approval>::from_bytes(remainder)?;
        let deploy = Deploy {
            hash,
            header,
            payment,
            session,
            approvals,
        };
        Ok((deploy, remainder))
    }
}

/// The preimage of the body hash: payment bytes followed by session bytes.
pub(crate) fn serialize_body(
    payment: &ExecutableDeployItem,
    session: &ExecutableDeployItem,
) -> Result<Vec<u8>, bytesrepr::Error> {
    let mut buffer =
        Vec::with_capacity(payment.serialized_length() + session.serialized_length());
    payment.write_bytes(&mut buffer)?;
    session.write_bytes(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        signer::{DeploySigner, Ed25519KeyPair, SignerConfig},
        testing, DeployBuilder,
    };

    #[test]
    fn header_should_serialize_fields_in_order() {
        let header = DeployHeader::new(
            PublicKey::Ed25519([1; 32]),
            Timestamp::from_millis(2),
            TimeDiff::from_millis(3),
            4,
            Digest::from([5; 32]),
            vec![DeployHash::new(Digest::from([6; 32]))],
            "c".to_string(),
        );
        let mut expected = vec![1];
        expected.extend_from_slice(&[1; 32]);
        expected.extend_from_slice(&[2, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[3, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[4, 0, 0, 0, 0, 0, 0, 0]);
        expected.extend_from_slice(&[5; 32]);
        expected.extend_from_slice(&[1, 0, 0, 0]);
        expected.extend_from_slice(&[6; 32]);
        expected.extend_from_slice(&[1, 0, 0, 0, b'c']);
        assert_eq!(header.to_bytes().unwrap(), expected);
        assert_eq!(header.serialized_length(), expected.len());
        let parsed: DeployHeader = bytesrepr::deserialize_from_slice(expected).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn should_round_trip_signed_deploy_through_bytes_and_json() {
        let key_pair = Ed25519KeyPair::from_secret_bytes([7; 32]);
        let deploy = testing::unsigned_deploy(&key_pair);
        let deploy = DeploySigner::new(SignerConfig::default())
            .sign(&deploy, &key_pair)
            .unwrap();

        let bytes = deploy.to_bytes().unwrap();
        assert_eq!(bytes.len(), deploy.serialized_length());
        let parsed: Deploy = bytesrepr::deserialize_from_slice(&bytes).unwrap();
        assert_eq!(parsed, deploy);

        let json = serde_json::to_string(&deploy).unwrap();
        let parsed: Deploy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, deploy);
        assert_eq!(parsed.is_valid(), Ok(()));
    }

    #[test]
    fn should_report_tampering_and_missing_approvals() {
        let key_pair = Ed25519KeyPair::from_secret_bytes([8; 32]);
        let deploy = testing::unsigned_deploy(&key_pair);
        assert_eq!(deploy.is_valid(), Err(DeployValidationFailure::EmptyApprovals));

        let mut tampered = deploy.clone();
        tampered.hash = DeployHash::new(Digest::hash(b"other"));
        assert_eq!(
            tampered.is_valid(),
            Err(DeployValidationFailure::InvalidDeployHash)
        );

        let mut tampered = deploy.clone();
        tampered.session = ExecutableDeployItem::new_standard_payment(1u64).unwrap();
        assert_eq!(tampered.is_valid(), Err(DeployValidationFailure::InvalidBodyHash));

        let mut forged = deploy;
        forged.approvals.push(Approval::new(
            *key_pair.public_key_ref(),
            Signature::Ed25519([0; 64]),
        ));
        assert!(matches!(
            forged.is_valid(),
            Err(DeployValidationFailure::InvalidApproval { index: 0, .. })
        ));
    }

    #[test]
    fn json_should_use_network_field_names() {
        let key_pair = Ed25519KeyPair::from_secret_bytes([9; 32]);
        let deploy = DeployBuilder::new()
            .with_sender(*key_pair.public_key_ref())
            .with_timestamp(Timestamp::from_millis(1_605_573_564_072))
            .with_standard_payment(10u64)
            .with_transfer_session(PublicKey::Ed25519([3; 32]), 2_500_000_000u64, Some(1))
            .build()
            .unwrap();
        let json = serde_json::to_value(&deploy).unwrap();
        let header = &json["header"];
        assert_eq!(header["timestamp"], "2020-11-17T00:39:24.072Z");
        assert_eq!(header["ttl"], "30m");
        assert_eq!(header["gas_price"], 1);
        assert_eq!(header["chain_name"], "casper-test");
        assert_eq!(header["dependencies"], serde_json::json!([]));
        assert_eq!(json["hash"], deploy.hash().to_string());
        assert_eq!(json["approvals"], serde_json::json!([]));
        assert!(json["session"]["Transfer"]["args"].is_array());
    }
}
