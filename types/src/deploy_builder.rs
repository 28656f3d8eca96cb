use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    bytesrepr::{Bytes, ToBytes},
    cl_value::CLValueError,
    crypto::PublicKey,
    deploy::{
        self, Deploy, DeployHash, DeployHeader, MAX_DEPENDENCIES, MAX_SERIALIZED_SIZE_OF_DEPLOY,
    },
    executable_deploy_item::{
        ContractHash, ContractPackageHash, ContractVersion, ExecutableDeployItem, TransferTarget,
    },
    runtime_args::RuntimeArgs,
    validation::ValidationError,
    Digest, TimeDiff, Timestamp, U512,
};

/// Chain name used when none is configured.
pub const DEFAULT_CHAIN_NAME: &str = "casper-test";

/// Network-level defaults applied to every deploy a builder produces.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// Name of the chain the deploy targets.
    pub chain_name: String,
    /// Price per gas unit.
    pub gas_price: u64,
    /// How long the deploy stays valid after its timestamp.
    pub ttl: TimeDiff,
}

impl Default for DeployConfig {
    fn default() -> Self {
        DeployConfig {
            chain_name: DEFAULT_CHAIN_NAME.to_string(),
            gas_price: Deploy::DEFAULT_GAS_PRICE,
            ttl: Deploy::DEFAULT_TTL,
        }
    }
}

/// Collects the parts of one deploy. [`DeployBuilder::build`] checks them and is the only place
/// a deploy is hashed.
#[derive(Clone, Debug)]
pub struct DeployBuilder {
    sender: Option<PublicKey>,
    chain_name: String,
    gas_price: u64,
    ttl: TimeDiff,
    timestamp: Option<Timestamp>,
    dependencies: Vec<DeployHash>,
    payment: Option<ExecutableDeployItem>,
    session: Option<ExecutableDeployItem>,
    // First argument-encoding failure, reported by `build`.
    error: Option<ValidationError>,
}

impl Default for DeployBuilder {
    fn default() -> Self {
        DeployBuilder::from_config(&DeployConfig::default())
    }
}

impl DeployBuilder {
    pub fn new() -> Self {
        DeployBuilder::default()
    }

    pub fn from_config(config: &DeployConfig) -> Self {
        DeployBuilder {
            sender: None,
            chain_name: config.chain_name.clone(),
            gas_price: config.gas_price,
            ttl: config.ttl,
            timestamp: None,
            dependencies: Vec::new(),
            payment: None,
            session: None,
            error: None,
        }
    }

    pub fn with_sender(mut self, sender: PublicKey) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_chain_name<S: Into<String>>(mut self, chain_name: S) -> Self {
        self.chain_name = chain_name.into();
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_ttl(mut self, ttl: TimeDiff) -> Self {
        self.ttl = ttl;
        self
    }

    /// Fixes the timestamp; otherwise the current time is taken in `build`.
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Deploys that must execute before this one. Duplicates are dropped, keeping the first
    /// occurrence.
    pub fn with_dependencies(mut self, dependencies: Vec<DeployHash>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_payment(mut self, payment: ExecutableDeployItem) -> Self {
        self.payment = Some(payment);
        self
    }

    pub fn with_session(mut self, session: ExecutableDeployItem) -> Self {
        self.session = Some(session);
        self
    }

    /// Standard payment: empty module bytes with a single `amount` argument.
    pub fn with_standard_payment<A: Into<U512>>(self, amount: A) -> Self {
        match ExecutableDeployItem::new_standard_payment(amount) {
            Ok(payment) => self.with_payment(payment),
            Err(error) => self.with_arg_error("amount", error),
        }
    }

    /// Native transfer of `amount` motes to `target`.
    pub fn with_transfer_session<T, A>(self, target: T, amount: A, transfer_id: Option<u64>) -> Self
    where
        T: Into<TransferTarget>,
        A: Into<U512>,
    {
        match ExecutableDeployItem::new_transfer(amount, target.into(), transfer_id) {
            Ok(session) => self.with_session(session),
            Err(error) => self.with_arg_error("transfer", error),
        }
    }

    pub fn with_contract_session<S: Into<String>>(
        self,
        contract_hash: ContractHash,
        entry_point: S,
        args: RuntimeArgs,
    ) -> Self {
        self.with_session(ExecutableDeployItem::new_stored_contract_by_hash(
            contract_hash,
            entry_point.into(),
            args,
        ))
    }

    pub fn with_named_contract_session<N: Into<String>, S: Into<String>>(
        self,
        name: N,
        entry_point: S,
        args: RuntimeArgs,
    ) -> Self {
        self.with_session(ExecutableDeployItem::new_stored_contract_by_name(
            name.into(),
            entry_point.into(),
            args,
        ))
    }

    /// Calls `version` of a contract package, or the latest enabled version when `None`.
    pub fn with_versioned_contract_session<S: Into<String>>(
        self,
        package_hash: ContractPackageHash,
        version: Option<ContractVersion>,
        entry_point: S,
        args: RuntimeArgs,
    ) -> Self {
        self.with_session(ExecutableDeployItem::new_stored_versioned_contract_by_hash(
            package_hash,
            version,
            entry_point.into(),
            args,
        ))
    }

    pub fn with_wasm_session<B: Into<Bytes>>(self, module_bytes: B, args: RuntimeArgs) -> Self {
        self.with_session(ExecutableDeployItem::new_module_bytes(
            module_bytes.into(),
            args,
        ))
    }

    fn with_arg_error(mut self, name: &str, error: CLValueError) -> Self {
        if self.error.is_none() {
            self.error = Some(ValidationError::InvalidArgument {
                name: name.to_string(),
                error,
            });
        }
        self
    }

    /// Validates the collected parts, then computes the body hash and deploy hash.
    ///
    /// The returned deploy carries no approvals.
    pub fn build(self) -> Result<Deploy, ValidationError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let account = self.sender.ok_or(ValidationError::MissingSender)?;
        let payment = self.payment.ok_or(ValidationError::MissingPayment)?;
        let session = self.session.ok_or(ValidationError::MissingSession)?;
        if self.chain_name.is_empty() {
            return Err(ValidationError::EmptyChainName);
        }
        if self.gas_price == 0 {
            return Err(ValidationError::InvalidGasPrice);
        }
        if self.ttl.is_zero() {
            return Err(ValidationError::InvalidTtl);
        }
        if self.ttl > Deploy::MAX_TTL {
            return Err(ValidationError::ExcessiveTimeToLive {
                max_ttl: Deploy::MAX_TTL,
                got: self.ttl,
            });
        }
        let dependencies: Vec<DeployHash> = self.dependencies.into_iter().unique().collect();
        if dependencies.len() > MAX_DEPENDENCIES as usize {
            return Err(ValidationError::ExcessiveDependencies {
                max_dependencies: MAX_DEPENDENCIES,
                got: dependencies.len(),
            });
        }
        let body_size = payment.serialized_length() + session.serialized_length();
        if body_size > MAX_SERIALIZED_SIZE_OF_DEPLOY as usize {
            return Err(ValidationError::ExcessiveSize {
                max_size: MAX_SERIALIZED_SIZE_OF_DEPLOY,
                got: body_size,
            });
        }

        let body_hash = Digest::hash(deploy::serialize_body(&payment, &session)?);
        let header = DeployHeader::new(
            account,
            self.timestamp.unwrap_or_else(Timestamp::now),
            self.ttl,
            self.gas_price,
            body_hash,
            dependencies,
            self.chain_name,
        );
        let hash = header.compute_hash()?;
        Ok(Deploy::from_parts(hash, header, payment, session))
    }
}
