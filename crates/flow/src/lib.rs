// Module declarations
pub mod account;
pub mod address;
pub mod client;
pub mod context;
pub mod error;
pub mod keypair;
pub mod registry;
pub mod sequence;

// Re-export commonly used types
pub use account::Account;
pub use address::Address;
pub use client::{AccountKey, FlowRestClient, LedgerClient, Network, RemoteAccount};
pub use context::{ProposalKey, ProposerContext};
pub use error::{ClientError, Error, Result};
pub use keypair::{AccountSigner, Credential, HashAlgorithm, KeyType, SignatureAlgorithm};
pub use registry::AccountRegistry;
pub use sequence::{LocalSequenceAllocator, SequenceAllocator};
