#![deny(clippy::complexity)]
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]

mod config;
mod transfer;

use std::path::PathBuf;

use anyhow::{Context, Error};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use casper_deploy_types::{DeployHash, PublicKey};
use casper_rpc_client::{
    rpcs::{
        account::{PutDeploy, PutDeployParams, PutDeployResult},
        RpcWithParams,
    },
    CancellationToken, DeployStatus, JsonRpcNodeClient, NodeClient,
};

use crate::{
    config::{read_config, Config},
    transfer::{
        build_signed_transfer, load_signing_key, KeyAlgorithmArg, TransferRequest,
        DEFAULT_TRANSFER_PAYMENT_AMOUNT,
    },
};

const DEFAULT_LOG_FILTER: &str = "warn,casper_rpc_client=info,casper_deploy_cli=info";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CmdLineArgs {
    /// Path to the TOML-formatted config file
    #[arg(short, long, value_name = "FILE")]
    path_to_config: Option<String>,

    /// JSON-RPC endpoint of the node, overriding the config file
    #[arg(short, long, value_name = "URL")]
    node_address: Option<String>,

    /// Print the collected metrics to stderr before exiting
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build, sign and submit a native transfer
    Transfer {
        /// File holding the sender's hex-encoded secret key
        #[arg(short, long, value_name = "FILE")]
        secret_key: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        key_algorithm: KeyAlgorithmArg,
        /// Recipient public key (hex) or account hash (`account-hash-…`)
        #[arg(short, long)]
        target: String,
        /// Amount in motes
        #[arg(short, long)]
        amount: String,
        #[arg(long)]
        transfer_id: Option<u64>,
        /// Standard payment in motes
        #[arg(long, default_value = DEFAULT_TRANSFER_PAYMENT_AMOUNT)]
        payment_amount: String,
        /// Print the signed deploy instead of submitting it
        #[arg(long)]
        dry_run: bool,
        /// Poll until the deploy has been executed
        #[arg(long)]
        wait: bool,
    },
    /// Check that the node is reachable and show its status
    Status,
    /// Show the execution status of a deploy
    DeployStatus { deploy_hash: DeployHash },
    /// Print the account hash of a public key
    AccountHash { public_key: PublicKey },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CmdLineArgs::parse();
    let config = match &args.path_to_config {
        Some(path) => read_config(path).context("Error constructing config")?,
        None => Config::default(),
    };
    debug!(?config, "configuration loaded");

    let result = run(&config, &args).await;
    if args.print_metrics {
        match metrics::metrics_summary() {
            Ok(summary) => eprintln!("{}", summary),
            Err(err) => warn!(%err, "could not collect metrics"),
        }
    }
    result
}

async fn run(config: &Config, args: &CmdLineArgs) -> Result<(), Error> {
    match &args.command {
        Command::AccountHash { public_key } => {
            println!("{}", public_key.to_account_hash());
            Ok(())
        }
        Command::Status => {
            let client = build_client(config, args)?;
            if !client.is_reachable().await {
                anyhow::bail!("node is not reachable");
            }
            let status = client.get_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::DeployStatus { deploy_hash } => {
            let client = build_client(config, args)?;
            let status = client.get_deploy_status(*deploy_hash).await?;
            println!("{}", status);
            Ok(())
        }
        Command::Transfer {
            secret_key,
            key_algorithm,
            target,
            amount,
            transfer_id,
            payment_amount,
            dry_run,
            wait,
        } => {
            let signer = load_signing_key(secret_key, *key_algorithm)?;
            let request = TransferRequest {
                target,
                amount,
                payment_amount,
                transfer_id: *transfer_id,
            };
            let deploy =
                build_signed_transfer(&config.deploy, config.signer, signer.as_ref(), &request)?;
            if *dry_run {
                println!("{}", serde_json::to_string_pretty(&deploy)?);
                return Ok(());
            }

            let client = build_client(config, args)?;
            let deploy_hash = submit(&client, PutDeployParams { deploy }).await?;
            println!("{}", deploy_hash);
            if *wait {
                let status = client
                    .wait_for_deploy(
                        deploy_hash,
                        config.wait.poll_interval(),
                        config.wait.timeout(),
                    )
                    .await?;
                println!("{}", status);
                if let DeployStatus::Failed { .. } = status {
                    anyhow::bail!("deploy {} failed", deploy_hash);
                }
            }
            Ok(())
        }
    }
}

fn build_client(config: &Config, args: &CmdLineArgs) -> Result<JsonRpcNodeClient, Error> {
    let rpc_config = config.rpc_client_config(args.node_address.as_deref())?;
    info!(endpoint = %rpc_config.endpoint, "connecting to node");
    Ok(JsonRpcNodeClient::new(rpc_config)?)
}

/// Sends the deploy, abandoning the request if the user hits Ctrl-C.
async fn submit(client: &JsonRpcNodeClient, params: PutDeployParams) -> Result<DeployHash, Error> {
    let cancellation_token = CancellationToken::new();
    let on_interrupt = cancellation_token.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = client
        .send_request_with_cancellation(
            PutDeploy::METHOD,
            Some(serde_json::to_value(params)?),
            cancellation_token,
        )
        .await;
    interrupt.abort();

    let result: PutDeployResult = serde_json::from_value(result?)
        .with_context(|| format!("Error decoding {} result", PutDeploy::METHOD))?;
    info!(deploy_hash = %result.deploy_hash, "deploy accepted");
    Ok(result.deploy_hash)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_line_should_be_consistent() {
        CmdLineArgs::command().debug_assert();
    }

    #[test]
    fn should_parse_a_transfer() {
        let target = PublicKey::Ed25519([1; 32]).to_hex();
        let args = CmdLineArgs::try_parse_from([
            "casper-deploy",
            "--node-address",
            "http://127.0.0.1:11101/rpc",
            "transfer",
            "--secret-key",
            "/tmp/secret_key.hex",
            "--target",
            &target,
            "--amount",
            "2500000000",
            "--wait",
        ])
        .unwrap();
        match args.command {
            Command::Transfer {
                key_algorithm,
                payment_amount,
                wait,
                dry_run,
                transfer_id,
                ..
            } => {
                assert_eq!(key_algorithm, KeyAlgorithmArg::Ed25519);
                assert_eq!(payment_amount, DEFAULT_TRANSFER_PAYMENT_AMOUNT);
                assert!(wait);
                assert!(!dry_run);
                assert_eq!(transfer_id, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn should_parse_typed_positionals() {
        let public_key = PublicKey::Ed25519([2; 32]);
        let args =
            CmdLineArgs::try_parse_from(["casper-deploy", "account-hash", &public_key.to_hex()])
                .unwrap();
        assert!(matches!(
            args.command,
            Command::AccountHash { public_key: parsed } if parsed == public_key
        ));
        assert!(CmdLineArgs::try_parse_from(["casper-deploy", "deploy-status", "xyz"]).is_err());
    }
}
