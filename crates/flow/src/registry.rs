use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::account::Account;
use crate::address::Address;
use crate::error::Result;
use crate::keypair::Credential;

/// One `Account` per address, created on first use and kept for the lifetime of the registry.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: Mutex<HashMap<Address, Arc<Account>>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached account for `address`, or creates it.
    ///
    /// The first registration wins: `credential` and `key_indexes` are ignored when the
    /// address is already known. A new account starts rotating from a random key so
    /// that freshly started instances do not all contend on the first one.
    pub fn get_or_create(
        &self,
        address: Address,
        credential: &Credential,
        key_indexes: &[u32],
    ) -> Result<Arc<Account>> {
        let mut accounts = self.accounts.lock();

        if let Some(existing) = accounts.get(&address) {
            debug!("Reusing cached account {}", address);
            return Ok(Arc::clone(existing));
        }

        // Account::new rejects an empty list
        let start = rand::thread_rng().gen_range(0..key_indexes.len().max(1));
        let signer = credential.signer()?;
        let account = Arc::new(Account::new(
            address,
            Arc::new(signer),
            key_indexes.to_vec(),
            start,
        )?);

        accounts.insert(address, Arc::clone(&account));
        info!(
            "Registered account {} with key indexes {:?} (starting at position {})",
            address, key_indexes, start
        );
        Ok(account)
    }

    pub fn get(&self, address: &Address) -> Option<Arc<Account>> {
        self.accounts.lock().get(address).cloned()
    }

    pub fn len(&self) -> usize {
        self.accounts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::keypair::HashAlgorithm;
    use std::str::FromStr;

    const PRIVATE_KEY: &str = "4d3c2b1a09f8e7d6c5b4a3928170f6e5d4c3b2a1908f7e6d5c4b3a2918070605";

    fn credential() -> Credential {
        Credential::local(PRIVATE_KEY, HashAlgorithm::Sha3_256)
    }

    fn address() -> Address {
        Address::from_str("0xf8d6e0586b0a20c7").unwrap()
    }

    #[test]
    fn test_first_writer_wins() {
        let registry = AccountRegistry::new();
        let first = registry.get_or_create(address(), &credential(), &[1, 2, 3]).unwrap();
        let second = registry.get_or_create(address(), &credential(), &[9]).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.key_indexes(), &[1, 2, 3]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_key_indexes_rejected() {
        let registry = AccountRegistry::new();
        match registry.get_or_create(address(), &credential(), &[]) {
            Err(Error::InvalidConfiguration(msg)) => assert!(msg.contains("no key indexes")),
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_bad_credential_does_not_affect_other_accounts() {
        let registry = AccountRegistry::new();
        let other = Address::from_str("0x01cf0e2f2f715450").unwrap();
        let bad = Credential::local("zz", HashAlgorithm::Sha3_256);

        assert!(matches!(
            registry.get_or_create(other, &bad, &[0]),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(registry.get(&other).is_none());
        assert!(registry.get_or_create(address(), &credential(), &[0]).is_ok());
    }

    #[test]
    fn test_starting_cursor_within_bounds() {
        for _ in 0..50 {
            let registry = AccountRegistry::new();
            let account = registry.get_or_create(address(), &credential(), &[10, 11, 12]).unwrap();
            assert!([10, 11, 12].contains(&account.next_key_index()));
        }
    }

    #[test]
    fn test_concurrent_first_registration_returns_same_account() {
        let registry = AccountRegistry::new();
        let credential = credential();

        let accounts: Vec<Arc<Account>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| registry.get_or_create(address(), &credential, &[0, 1, 2, 3]).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(registry.len(), 1);
        assert!(accounts.iter().all(|a| Arc::ptr_eq(a, &accounts[0])));
    }

    #[test]
    fn test_later_lookups_do_not_reset_cursor() {
        let registry = AccountRegistry::new();
        let account = registry.get_or_create(address(), &credential(), &[0, 1, 2, 3]).unwrap();
        let first = account.next_key_index();

        let again = registry.get_or_create(address(), &credential(), &[0, 1, 2, 3]).unwrap();
        let second = again.next_key_index();
        assert_eq!(second, (first + 1) % 4);
    }
}
