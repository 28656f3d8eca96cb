//! Turning command line arguments into a signed transfer deploy.

use std::path::Path;

use anyhow::{Context, Error};
use clap::ValueEnum;

use casper_deploy_types::{
    parse_motes, signer::SigningProvider, AccountHash, Deploy, DeployBuilder, DeployConfig,
    DeploySigner, Ed25519KeyPair, PublicKey, Secp256k1KeyPair, SignerConfig, TransferTarget,
};

/// Standard payment attached to a native transfer, in motes.
pub const DEFAULT_TRANSFER_PAYMENT_AMOUNT: &str = "100000000";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum KeyAlgorithmArg {
    #[default]
    Ed25519,
    Secp256k1,
}

/// Reads a hex-encoded secret key from `path`.
pub fn load_signing_key(
    path: &Path,
    algorithm: KeyAlgorithmArg,
) -> Result<Box<dyn SigningProvider>, Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading secret key file {}", path.display()))?;
    let provider: Box<dyn SigningProvider> = match algorithm {
        KeyAlgorithmArg::Ed25519 => Box::new(
            Ed25519KeyPair::from_secret_hex(&content).context("Invalid ed25519 secret key")?,
        ),
        KeyAlgorithmArg::Secp256k1 => Box::new(
            Secp256k1KeyPair::from_secret_hex(&content).context("Invalid secp256k1 secret key")?,
        ),
    };
    Ok(provider)
}

/// Accepts either a hex public key or an `account-hash-…` string.
pub fn parse_target(input: &str) -> Result<TransferTarget, Error> {
    if input.starts_with("account-hash-") {
        let account_hash =
            AccountHash::from_formatted_str(input).context("Invalid target account hash")?;
        return Ok(account_hash.into());
    }
    let public_key = PublicKey::from_hex(input).context("Invalid target public key")?;
    Ok(public_key.into())
}

pub struct TransferRequest<'a> {
    pub target: &'a str,
    pub amount: &'a str,
    pub payment_amount: &'a str,
    pub transfer_id: Option<u64>,
}

/// Builds a transfer from `signer`'s account and signs it.
pub fn build_signed_transfer(
    deploy_config: &DeployConfig,
    signer_config: SignerConfig,
    signer: &dyn SigningProvider,
    request: &TransferRequest,
) -> Result<Deploy, Error> {
    let target = parse_target(request.target)?;
    let amount = parse_motes(request.amount).context("Invalid transfer amount")?;
    let payment_amount = parse_motes(request.payment_amount).context("Invalid payment amount")?;

    let deploy = DeployBuilder::from_config(deploy_config)
        .with_sender(signer.public_key())
        .with_standard_payment(payment_amount)
        .with_transfer_session(target, amount, request.transfer_id)
        .build()
        .context("Error building transfer deploy")?;
    DeploySigner::new(signer_config)
        .sign(&deploy, signer)
        .context("Error signing transfer deploy")
}
