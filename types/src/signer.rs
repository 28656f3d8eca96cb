//! Adding approvals to built deploys.
//!
//! The signature primitives live behind [`SigningProvider`]; this module only decides what gets
//! signed (the raw 32 bytes of the deploy hash) and how approvals accumulate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    crypto::{KeyAlgorithm, KeyError, PublicKey, Signature, SIGNATURE_LENGTH},
    deploy::{Approval, Deploy},
};

/// Errors raised while signing a deploy.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SigningError {
    /// The signing capability refused or failed; the message is passed through unchanged.
    #[error("signing provider failed: {0}")]
    Provider(String),

    /// The provider produced a signature for a different algorithm than its key.
    #[error("provider key is {key} but produced a {signature} signature")]
    AlgorithmMismatch {
        key: KeyAlgorithm,
        signature: KeyAlgorithm,
    },

    /// The deploy already carries an approval from this key.
    #[error("deploy already approved by {0}")]
    DuplicateSigner(PublicKey),

    /// Secret key material could not be loaded.
    #[error(transparent)]
    InvalidKey(#[from] KeyError),
}

/// Something that can sign bytes with a private key it keeps to itself.
pub trait SigningProvider {
    /// The public half of the signing key.
    fn public_key(&self) -> PublicKey;

    /// Signs `message`, returning a signature of the same algorithm as [`Self::public_key`].
    fn sign(&self, message: &[u8]) -> Result<Signature, SigningError>;
}

/// What to do when a key that already approved a deploy signs it again.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSignerPolicy {
    /// Replace the earlier approval in place, keeping its position.
    #[default]
    Replace,
    /// Fail with [`SigningError::DuplicateSigner`].
    Reject,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SignerConfig {
    #[serde(default)]
    pub duplicate_signer_policy: DuplicateSignerPolicy,
}

/// Appends approvals to deploys according to a [`SignerConfig`].
#[derive(Clone, Debug, Default)]
pub struct DeploySigner {
    config: SignerConfig,
}

impl DeploySigner {
    pub fn new(config: SignerConfig) -> Self {
        DeploySigner { config }
    }

    /// Returns a copy of `deploy` with an approval from `provider` added.
    ///
    /// The hash and header of the result are identical to those of `deploy`.
    pub fn sign<P: SigningProvider + ?Sized>(
        &self,
        deploy: &Deploy,
        provider: &P,
    ) -> Result<Deploy, SigningError> {
        let signer = provider.public_key();
        let existing = deploy
            .approvals()
            .iter()
            .position(|approval| *approval.signer() == signer);
        if existing.is_some() && self.config.duplicate_signer_policy == DuplicateSignerPolicy::Reject
        {
            return Err(SigningError::DuplicateSigner(signer));
        }

        let signature = provider.sign(deploy.hash().as_ref())?;
        if signature.algorithm() != signer.algorithm() {
            return Err(SigningError::AlgorithmMismatch {
                key: signer.algorithm(),
                signature: signature.algorithm(),
            });
        }

        let approval = Approval::new(signer, signature);
        let mut signed = deploy.clone();
        match existing {
            Some(index) => signed.approvals_mut()[index] = approval,
            None => signed.approvals_mut().push(approval),
        }
        Ok(signed)
    }
}

/// An Ed25519 key held in memory, backed by `ed25519-dalek`.
pub struct Ed25519KeyPair {
    signing_key: ed25519_dalek::SigningKey,
    public_key: PublicKey,
}

impl Ed25519KeyPair {
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret);
        let public_key = PublicKey::Ed25519(signing_key.verifying_key().to_bytes());
        Ed25519KeyPair {
            signing_key,
            public_key,
        }
    }

    /// Loads a key from 64 hex characters of secret key bytes.
    pub fn from_secret_hex(input: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(input.trim())?;
        let secret = <[u8; 32]>::try_from(bytes.as_slice()).map_err(|_| {
            KeyError::InvalidLength {
                algorithm: KeyAlgorithm::Ed25519,
                expected: 32,
                got: bytes.len(),
            }
        })?;
        Ok(Ed25519KeyPair::from_secret_bytes(secret))
    }

    pub fn public_key_ref(&self) -> &PublicKey {
        &self.public_key
    }
}

impl SigningProvider for Ed25519KeyPair {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SigningError> {
        use ed25519_dalek::Signer as _;
        let signature = self
            .signing_key
            .try_sign(message)
            .map_err(|error| SigningError::Provider(error.to_string()))?;
        Ok(Signature::Ed25519(signature.to_bytes()))
    }
}

/// A secp256k1 key held in memory, backed by `k256`. Signs ECDSA over SHA-256.
pub struct Secp256k1KeyPair {
    signing_key: k256::ecdsa::SigningKey,
    public_key: PublicKey,
}

impl Secp256k1KeyPair {
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, KeyError> {
        let signing_key = k256::ecdsa::SigningKey::from_slice(secret)
            .map_err(|error| KeyError::InvalidSecretKey(error.to_string()))?;
        let encoded = signing_key.verifying_key().to_encoded_point(true);
        let public_key = PublicKey::from_raw(KeyAlgorithm::Secp256k1, encoded.as_bytes())?;
        Ok(Secp256k1KeyPair {
            signing_key,
            public_key,
        })
    }

    pub fn from_secret_hex(input: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(input.trim())?;
        Secp256k1KeyPair::from_secret_bytes(&bytes)
    }

    pub fn public_key_ref(&self) -> &PublicKey {
        &self.public_key
    }
}

impl SigningProvider for Secp256k1KeyPair {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn sign(&self, message: &[u8]) -> Result<Signature, SigningError> {
        use k256::ecdsa::signature::Signer as _;
        let signature: k256::ecdsa::Signature = self
            .signing_key
            .try_sign(message)
            .map_err(|error| SigningError::Provider(error.to_string()))?;
        let mut raw = [0u8; SIGNATURE_LENGTH];
        raw.copy_from_slice(&signature.to_bytes());
        Ok(Signature::Secp256k1(raw))
    }
}
