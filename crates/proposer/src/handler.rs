use anyhow::{Context, Result};
use flow::{Account, ProposalKey, ProposerContext};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Serialize)]
pub struct SignOutput {
    pub address: String,
    pub public_key: String,
    pub signature_algorithm: &'static str,
    pub hash_algorithm: &'static str,
    pub signature: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct KeyReport {
    pub index: u32,
    pub configured: bool,
    pub revoked: bool,
    pub weight: u32,
    pub remote_sequence_number: u64,
    pub last_allocated: Option<u64>,
}

/// Allocates `count` proposal keys at once, the way a batch of transactions would
pub async fn proposal_keys(ctx: &ProposerContext, account: &Account, count: usize) -> Result<Vec<ProposalKey>> {
    info!("Allocating {} proposal keys for {}", count, account.address());
    let start = std::time::Instant::now();

    let results = join_all((0..count).map(|_| ctx.get_proposal_key(account))).await;

    let mut keys = Vec::with_capacity(count);
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(key) => keys.push(key),
            Err(e) => {
                error!("Proposal key {} of {} failed: {}", i + 1, count, e);
                return Err(e).context("failed to allocate proposal keys");
            }
        }
    }

    info!("Allocated {} proposal keys in {}ms", keys.len(), start.elapsed().as_millis());
    Ok(keys)
}

pub fn sign(account: &Account, message: &str, is_hex: bool) -> Result<SignOutput> {
    let bytes = if is_hex {
        let hex_str = message.strip_prefix("0x").unwrap_or(message);
        hex::decode(hex_str).context("message is not valid hex")?
    } else {
        message.as_bytes().to_vec()
    };
    debug!("Signing {} bytes with {}", bytes.len(), account.address());

    let signer = account.signer();
    let signature = signer.sign(&bytes).context("failed to sign message")?;
    Ok(SignOutput {
        address: account.address().to_string(),
        public_key: signer.public_key_hex(),
        signature_algorithm: signer.signature_algorithm().as_str(),
        hash_algorithm: signer.hash_algorithm().as_str(),
        signature: hex::encode(signature),
    })
}

pub async fn keys(ctx: &ProposerContext, account: &Account) -> Result<Vec<KeyReport>> {
    let address = account.address();
    let remote = ctx
        .client()
        .get_account(address)
        .await
        .with_context(|| format!("failed to fetch account {}", address))?;

    let mut reports = Vec::with_capacity(remote.keys.len());
    for key in remote.keys {
        reports.push(KeyReport {
            index: key.index,
            configured: account.key_indexes().contains(&key.index),
            revoked: key.revoked,
            weight: key.weight,
            remote_sequence_number: key.sequence_number,
            last_allocated: ctx.sequences().last_allocated(address, key.index).await,
        });
    }
    Ok(reports)
}

/// Builds the context and the admin account from configuration
pub fn build(config: &config::Config) -> Result<(Arc<ProposerContext>, Arc<Account>)> {
    let client = flow::FlowRestClient::new(&config.access_api_host, config.request_timeout)
        .context("failed to create Flow REST client")?;
    let ctx = Arc::new(ProposerContext::new(Arc::new(client)));
    let account = ctx
        .account(
            config.admin_address,
            &config.admin_credential,
            &config.admin_key_indexes,
        )
        .context("failed to register admin account")?;
    Ok((ctx, account))
}
