//! Testing utilities.
//!
//! Contains deploy fixtures to aid writing tests against this crate and the RPC client.

use rand::Rng;

use crate::{
    signer::SigningProvider, Deploy, DeployBuilder, DeployHash, Digest, ExecutableDeployItem,
    PublicKey, TimeDiff, Timestamp,
};

/// Timestamp used by the fixed fixtures.
pub const FIXTURE_TIMESTAMP: Timestamp = Timestamp::from_millis(1_605_573_564_072);

/// An unsigned transfer deploy sent from `sender`'s account with a fixed timestamp.
pub fn unsigned_deploy<P: SigningProvider + ?Sized>(sender: &P) -> Deploy {
    DeployBuilder::new()
        .with_sender(sender.public_key())
        .with_timestamp(FIXTURE_TIMESTAMP)
        .with_standard_payment(100_000_000u64)
        .with_transfer_session(PublicKey::Ed25519([0xaa; 32]), 2_500_000_000u64, Some(1))
        .build()
        .unwrap_or_else(|error| panic!("fixture deploy should build: {}", error))
}

/// A deploy with random header fields and random session code.
pub fn random_deploy<R: Rng + ?Sized>(rng: &mut R, sender: PublicKey) -> Deploy {
    let timestamp = Timestamp::from_millis(rng.gen_range(1_600_000_000_000..1_800_000_000_000));
    let ttl = TimeDiff::from_millis(rng.gen_range(60_000..3_600_000));
    let dependencies = (0..rng.gen_range(0..4))
        .map(|_| DeployHash::new(Digest::hash(rng.gen::<u64>().to_le_bytes())))
        .collect();
    let session: ExecutableDeployItem = rng.gen();

    DeployBuilder::new()
        .with_sender(sender)
        .with_timestamp(timestamp)
        .with_ttl(ttl)
        .with_gas_price(rng.gen_range(1..100))
        .with_dependencies(dependencies)
        .with_standard_payment(rng.gen::<u64>())
        .with_session(session)
        .build()
        .unwrap_or_else(|error| panic!("random deploy should build: {}", error))
}
