use anyhow::{Context, Result, anyhow};
use flow::{Address, Credential, HashAlgorithm, KeyType, SignatureAlgorithm};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

pub const ADMIN_ADDRESS: &str = "FLOW_PDS_ADMIN_ADDRESS";
pub const ADMIN_PRIVATE_KEY: &str = "FLOW_PDS_ADMIN_PRIVATE_KEY";
pub const ADMIN_PRIVATE_KEY_INDEXES: &str = "FLOW_PDS_ADMIN_PRIVATE_KEY_INDEXES";
pub const ADMIN_PRIVATE_KEY_TYPE: &str = "FLOW_PDS_ADMIN_PRIVATE_KEY_TYPE";
pub const ADMIN_PRIVATE_KEY_HASH: &str = "FLOW_PDS_ADMIN_PRIVATE_KEY_HASH";
pub const ADMIN_PRIVATE_KEY_ALGO: &str = "FLOW_PDS_ADMIN_PRIVATE_KEY_ALGO";
pub const ACCESS_API_HOST: &str = "FLOW_PDS_ACCESS_API_HOST";
pub const REQUEST_TIMEOUT_SECS: &str = "FLOW_PDS_REQUEST_TIMEOUT_SECS";

const DEFAULT_KEY_INDEXES: &str = "0";
const DEFAULT_KEY_TYPE: &str = "local";
const DEFAULT_KEY_HASH: &str = "SHA3_256";
const DEFAULT_KEY_ALGO: &str = "ECDSA_P256";
const DEFAULT_ACCESS_API_HOST: &str = "http://localhost:8888";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Settings for the admin account the service proposes transactions with
#[derive(Debug, Clone)]
pub struct Config {
    pub admin_address: Address,
    pub admin_credential: Credential,
    pub admin_key_indexes: Vec<u32>,
    pub access_api_host: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment, after loading `env_file` if given
    pub fn from_env(env_file: Option<&Path>) -> Result<Self> {
        if let Some(path) = env_file {
            // Missing files are fine inside containers where the environment is set directly
            if let Err(e) = dotenvy::from_path(path) {
                warn!("Could not load environment variables from {}: {}", path.display(), e);
            } else {
                debug!("Loaded environment variables from {}", path.display());
            }
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let admin_address = Address::from_str(&required(&lookup, ADMIN_ADDRESS)?)
            .with_context(|| format!("{} is not a valid address", ADMIN_ADDRESS))?;

        let private_key = required(&lookup, ADMIN_PRIVATE_KEY)?;
        let key_type = KeyType::from_str(&optional(&lookup, ADMIN_PRIVATE_KEY_TYPE, DEFAULT_KEY_TYPE))?;
        let hash_algorithm =
            HashAlgorithm::from_str(&optional(&lookup, ADMIN_PRIVATE_KEY_HASH, DEFAULT_KEY_HASH))?;
        let signature_algorithm =
            SignatureAlgorithm::from_str(&optional(&lookup, ADMIN_PRIVATE_KEY_ALGO, DEFAULT_KEY_ALGO))?;

        let admin_key_indexes = parse_key_indexes(&optional(
            &lookup,
            ADMIN_PRIVATE_KEY_INDEXES,
            DEFAULT_KEY_INDEXES,
        ))?;

        let access_api_host = optional(&lookup, ACCESS_API_HOST, DEFAULT_ACCESS_API_HOST);
        let request_timeout = match lookup(REQUEST_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{} must be a number of seconds", REQUEST_TIMEOUT_SECS))?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            admin_address,
            admin_credential: Credential {
                key_type,
                private_key,
                signature_algorithm,
                hash_algorithm,
            },
            admin_key_indexes,
            access_api_host,
            request_timeout: Duration::from_secs(request_timeout),
        })
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("environment variable {} is required and must not be empty", name))
}

fn optional<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parses a comma separated list such as `0,1,2`
pub fn parse_key_indexes(value: &str) -> Result<Vec<u32>> {
    let indexes = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .with_context(|| format!("invalid key index '{}' in {}", s, ADMIN_PRIVATE_KEY_INDEXES))
        })
        .collect::<Result<Vec<_>>>()?;

    if indexes.is_empty() {
        return Err(anyhow!("{} must list at least one key index", ADMIN_PRIVATE_KEY_INDEXES));
    }
    Ok(indexes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const KEY: &str = "9f8e7d6c5b4a39281706f5e4d3c2b1a0998877665544332211000ffeeddccbba";

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            (ADMIN_ADDRESS, "0xf8d6e0586b0a20c7"),
            (ADMIN_PRIVATE_KEY, KEY),
        ]))
        .unwrap();

        assert_eq!(config.admin_address.to_string(), "0xf8d6e0586b0a20c7");
        assert_eq!(config.admin_key_indexes, vec![0]);
        assert_eq!(config.admin_credential.key_type, KeyType::Local);
        assert_eq!(config.admin_credential.signature_algorithm, SignatureAlgorithm::EcdsaP256);
        assert_eq!(config.admin_credential.hash_algorithm, HashAlgorithm::Sha3_256);
        assert_eq!(config.access_api_host, "http://localhost:8888");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_all_values() {
        let config = Config::from_lookup(lookup(&[
            (ADMIN_ADDRESS, "01cf0e2f2f715450"),
            (ADMIN_PRIVATE_KEY, KEY),
            (ADMIN_PRIVATE_KEY_INDEXES, "0, 1,2,,5"),
            (ADMIN_PRIVATE_KEY_TYPE, "LOCAL"),
            (ADMIN_PRIVATE_KEY_HASH, "SHA2_256"),
            (ADMIN_PRIVATE_KEY_ALGO, "ECDSA_secp256k1"),
            (ACCESS_API_HOST, "testnet"),
            (REQUEST_TIMEOUT_SECS, "3"),
        ]))
        .unwrap();

        assert_eq!(config.admin_key_indexes, vec![0, 1, 2, 5]);
        assert_eq!(config.admin_credential.hash_algorithm, HashAlgorithm::Sha2_256);
        assert_eq!(
            config.admin_credential.signature_algorithm,
            SignatureAlgorithm::EcdsaSecp256k1
        );
        assert_eq!(config.access_api_host, "testnet");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert!(config.admin_credential.signer().is_ok());
    }

    #[test]
    fn test_required_values() {
        let err = Config::from_lookup(lookup(&[(ADMIN_PRIVATE_KEY, KEY)])).unwrap_err();
        assert!(err.to_string().contains(ADMIN_ADDRESS));

        let err = Config::from_lookup(lookup(&[
            (ADMIN_ADDRESS, "0xf8d6e0586b0a20c7"),
            (ADMIN_PRIVATE_KEY, "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ADMIN_PRIVATE_KEY));
    }

    #[test]
    fn test_rejects_bad_values() {
        let base = [
            (ADMIN_ADDRESS, "0xf8d6e0586b0a20c7"),
            (ADMIN_PRIVATE_KEY, KEY),
        ];
        for extra in [
            (ADMIN_PRIVATE_KEY_INDEXES, "0,x"),
            (ADMIN_PRIVATE_KEY_INDEXES, ",,"),
            (ADMIN_PRIVATE_KEY_TYPE, "google_kms"),
            (ADMIN_PRIVATE_KEY_HASH, "MD5"),
            (ADMIN_PRIVATE_KEY_ALGO, "ED25519"),
            (REQUEST_TIMEOUT_SECS, "soon"),
        ] {
            let mut vars = base.to_vec();
            vars.push(extra);
            assert!(Config::from_lookup(lookup(&vars)).is_err(), "{:?} should be rejected", extra);
        }
    }
}
