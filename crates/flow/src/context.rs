use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::account::Account;
use crate::address::Address;
use crate::client::LedgerClient;
use crate::error::{Error, Result};
use crate::keypair::Credential;
use crate::registry::AccountRegistry;
use crate::sequence::{LocalSequenceAllocator, SequenceAllocator};

/// The (key index, sequence number) pair a transaction is proposed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposalKey {
    pub address: Address,
    pub key_index: u32,
    pub sequence_number: u64,
}

/// Owns the account registry and the sequence allocator for one transaction pipeline.
pub struct ProposerContext {
    client: Arc<dyn LedgerClient>,
    registry: AccountRegistry,
    sequences: Arc<dyn SequenceAllocator>,
}

impl ProposerContext {
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self::with_allocator(client, Arc::new(LocalSequenceAllocator::new()))
    }

    pub fn with_allocator(client: Arc<dyn LedgerClient>, sequences: Arc<dyn SequenceAllocator>) -> Self {
        Self {
            client,
            registry: AccountRegistry::new(),
            sequences,
        }
    }

    pub fn client(&self) -> &Arc<dyn LedgerClient> {
        &self.client
    }

    pub fn registry(&self) -> &AccountRegistry {
        &self.registry
    }

    pub fn sequences(&self) -> &Arc<dyn SequenceAllocator> {
        &self.sequences
    }

    pub fn account(
        &self,
        address: Address,
        credential: &Credential,
        key_indexes: &[u32],
    ) -> Result<Arc<Account>> {
        self.registry.get_or_create(address, credential, key_indexes)
    }

    /// Picks the next key of `account` and the sequence number to propose it with.
    ///
    /// The key rotation advances even when the account query fails, so a retry uses
    /// the next key. The sequence cache is only touched once the query succeeded.
    pub async fn get_proposal_key(&self, account: &Account) -> Result<ProposalKey> {
        let address = account.address();
        let key_index = account.next_key_index();

        let remote = self
            .client
            .get_account(address)
            .await
            .map_err(|source| {
                warn!("Failed to fetch account {} for key {}: {}", address, key_index, source);
                Error::RemoteQueryFailed { address, source }
            })?;

        let key = remote
            .key(key_index)
            .ok_or(Error::KeyNotFound { address, key_index })?;
        if key.revoked {
            return Err(Error::KeyRevoked { address, key_index });
        }

        let sequence_number = self
            .sequences
            .next_sequence_number(address, key_index, key.sequence_number)
            .await?;
        debug!(
            "Proposal key for {}: key {} seq {} (remote {})",
            address, key_index, sequence_number, key.sequence_number
        );

        Ok(ProposalKey {
            address,
            key_index,
            sequence_number,
        })
    }
}
