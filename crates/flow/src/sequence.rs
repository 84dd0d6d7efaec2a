use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

use crate::address::Address;
use crate::error::{Error, Result};

/// Hands out the sequence number to put in a transaction's proposal key.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// `remote_sequence_number` is the latest value the ledger reports for the key.
    /// It only reflects sealed transactions and may lag behind ones already sent.
    async fn next_sequence_number(
        &self,
        address: Address,
        key_index: u32,
        remote_sequence_number: u64,
    ) -> Result<u64>;

    async fn last_allocated(&self, address: Address, key_index: u32) -> Option<u64>;
}

/// In-memory allocator that runs ahead of the ledger while transactions are in flight.
///
/// The ledger reports the sequence number of sealed transactions only, so several
/// transactions sent within the same block would all see the same value. This keeps the
/// last number handed out per key and increments it until the ledger catches up.
///
/// NOTE: only correct within a single process. Several instances signing with the same
/// key will collide and the ledger rejects the duplicates.
#[derive(Debug, Default)]
pub struct LocalSequenceAllocator {
    last: Mutex<HashMap<(Address, u32), u64>>,
}

impl LocalSequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self, address: Address, key_index: u32, remote: u64) -> Result<u64> {
        let mut last = self.last.lock();

        match last.entry((address, key_index)) {
            Entry::Vacant(entry) => {
                debug!("First allocation for {}#{}: using remote sequence {}", address, key_index, remote);
                entry.insert(remote);
                Ok(remote)
            }
            Entry::Occupied(mut entry) => {
                let cached = *entry.get();
                let next = if cached >= remote {
                    cached
                        .checked_add(1)
                        .ok_or(Error::SequenceExhausted { address, key_index })?
                } else {
                    debug!(
                        "Ledger caught up for {}#{}: remote {} > local {}",
                        address, key_index, remote, cached
                    );
                    remote
                };
                entry.insert(next);
                Ok(next)
            }
        }
    }
}

#[async_trait]
impl SequenceAllocator for LocalSequenceAllocator {
    async fn next_sequence_number(
        &self,
        address: Address,
        key_index: u32,
        remote_sequence_number: u64,
    ) -> Result<u64> {
        self.allocate(address, key_index, remote_sequence_number)
    }

    async fn last_allocated(&self, address: Address, key_index: u32) -> Option<u64> {
        self.last.lock().get(&(address, key_index)).copied()
    }
}
