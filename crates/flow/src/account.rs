use parking_lot::Mutex;
use std::sync::Arc;

use crate::address::Address;
use crate::error::{Error, Result};
use crate::keypair::AccountSigner;

/// An operator account and the keys it rotates through when proposing transactions.
///
/// The key index list is fixed at construction. The rotation cursor is the only
/// mutable state and always stays within the list bounds.
#[derive(Debug)]
pub struct Account {
    address: Address,
    signer: Arc<AccountSigner>,
    key_indexes: Vec<u32>,
    next_key_index_index: Mutex<usize>,
}

impl Account {
    pub(crate) fn new(
        address: Address,
        signer: Arc<AccountSigner>,
        key_indexes: Vec<u32>,
        start: usize,
    ) -> Result<Self> {
        if key_indexes.is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "Account {} has no key indexes configured",
                address
            )));
        }
        let start = start % key_indexes.len();

        Ok(Self {
            address,
            signer,
            key_indexes,
            next_key_index_index: Mutex::new(start),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn key_indexes(&self) -> &[u32] {
        &self.key_indexes
    }

    pub fn signer(&self) -> Arc<AccountSigner> {
        Arc::clone(&self.signer)
    }

    /// Returns the key index under the cursor and advances the cursor.
    pub fn next_key_index(&self) -> u32 {
        let mut cursor = self.next_key_index_index.lock();
        let key_index = self.key_indexes[*cursor];
        *cursor = (*cursor + 1) % self.key_indexes.len();
        key_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::{HashAlgorithm, SignatureAlgorithm};
    use std::collections::HashMap;
    use std::str::FromStr;

    const PRIVATE_KEY: &str = "1f2e3d4c5b6a79880716253443526170fedcba98765432100123456789abcdef";

    fn account(key_indexes: Vec<u32>, start: usize) -> Result<Account> {
        let signer = AccountSigner::from_hex(PRIVATE_KEY, SignatureAlgorithm::EcdsaP256, HashAlgorithm::Sha3_256).unwrap();
        Account::new(
            Address::from_str("0xf8d6e0586b0a20c7").unwrap(),
            Arc::new(signer),
            key_indexes,
            start,
        )
    }

    #[test]
    fn test_empty_key_indexes_rejected() {
        assert!(matches!(account(vec![], 0), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_round_robin_from_start() {
        let account = account(vec![3, 5, 7], 1).unwrap();
        let picked: Vec<u32> = (0..6).map(|_| account.next_key_index()).collect();
        assert_eq!(picked, vec![5, 7, 3, 5, 7, 3]);
    }

    #[test]
    fn test_start_is_wrapped_into_bounds() {
        let account = account(vec![0, 1], 5).unwrap();
        assert_eq!(account.next_key_index(), 1);
        assert_eq!(account.next_key_index(), 0);
    }

    #[test]
    fn test_rotation_fairness_under_contention() {
        let account = account(vec![0, 1, 2, 3], 2).unwrap();
        let rounds = 250;
        let threads = 8;

        let counts = std::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    s.spawn(|| {
                        (0..rounds * account.key_indexes().len() / threads)
                            .map(|_| account.next_key_index())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut counts: HashMap<u32, usize> = HashMap::new();
            for handle in handles {
                for key_index in handle.join().unwrap() {
                    *counts.entry(key_index).or_default() += 1;
                }
            }
            counts
        });

        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|&c| c == rounds));
    }
}
