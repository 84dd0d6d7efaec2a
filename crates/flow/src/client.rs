use async_trait::async_trait;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::address::Address;
use crate::error::{ClientError, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Emulator,
    Testnet,
    Mainnet,
}

impl Network {
    pub fn rest_url(&self) -> &'static str {
        match self {
            Network::Emulator => EMULATOR_REST_URL,
            Network::Testnet => TESTNET_REST_URL,
            Network::Mainnet => MAINNET_REST_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Emulator => "emulator",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "emulator" => Ok(Network::Emulator),
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            _ => Err(Error::InvalidConfiguration(format!(
                "Unknown network: {}. Please use 'emulator', 'testnet', or 'mainnet'.",
                s
            ))),
        }
    }
}

const EMULATOR_REST_URL: &str = "http://localhost:8888";
const TESTNET_REST_URL: &str = "https://rest-testnet.onflow.org";
const MAINNET_REST_URL: &str = "https://rest-mainnet.onflow.org";

/// Accepts a network name, an access node URL, or a bare `host:port` (taken as plain http)
pub fn resolve_access_api_host(host: &str) -> String {
    let host = host.trim();
    match Network::from_str(host) {
        Ok(network) => network.rest_url().to_string(),
        Err(_) if host.contains("://") => host.trim_end_matches('/').to_string(),
        Err(_) => format!("http://{}", host.trim_end_matches('/')),
    }
}

/// A key registered on an account, as the ledger currently sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountKey {
    pub index: u32,
    pub public_key: String,
    pub sequence_number: u64,
    pub weight: u32,
    pub revoked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAccount {
    pub address: Address,
    pub keys: Vec<AccountKey>,
}

impl RemoteAccount {
    pub fn key(&self, index: u32) -> Option<&AccountKey> {
        self.keys.iter().find(|k| k.index == index)
    }
}

/// The single remote query the allocator performs.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_account(&self, address: Address) -> Result<RemoteAccount, ClientError>;
}

/// Client for the Flow Access REST API
#[derive(Debug, Clone)]
pub struct FlowRestClient {
    http: reqwest::Client,
    base_url: String,
}

impl FlowRestClient {
    pub fn new(access_api_host: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = resolve_access_api_host(access_api_host);
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        info!("Flow REST client created for {}", base_url);
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LedgerClient for FlowRestClient {
    async fn get_account(&self, address: Address) -> Result<RemoteAccount, ClientError> {
        let url = format!("{}/v1/accounts/{}", self.base_url, address.to_hex());
        debug!("Fetching account keys from {}", url);

        let start = std::time::Instant::now();
        let response = self
            .http
            .get(&url)
            .query(&[("expand", "keys")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: AccountResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let account = body.into_remote_account(address)?;
        debug!(
            "Fetched {} keys for {} in {}ms",
            account.keys.len(),
            address,
            start.elapsed().as_millis()
        );
        Ok(account)
    }
}

// The REST API encodes uint64 fields as JSON strings
#[derive(Debug, Deserialize)]
struct AccountResponse {
    address: Option<String>,
    #[serde(default)]
    keys: Vec<AccountKeyResponse>,
}

#[derive(Debug, Deserialize)]
struct AccountKeyResponse {
    index: String,
    public_key: String,
    sequence_number: String,
    weight: String,
    #[serde(default)]
    revoked: bool,
}

impl AccountResponse {
    fn into_remote_account(self, requested: Address) -> Result<RemoteAccount, ClientError> {
        let address = match self.address.as_deref() {
            Some(s) => Address::from_str(s).map_err(|e| ClientError::Decode(e.to_string()))?,
            None => requested,
        };
        if address != requested {
            return Err(ClientError::Decode(format!(
                "Requested account {} but received {}",
                requested, address
            )));
        }

        let keys = self
            .keys
            .into_iter()
            .map(|k| {
                Ok(AccountKey {
                    index: parse_field("index", &k.index)?,
                    public_key: k.public_key,
                    sequence_number: parse_field("sequence_number", &k.sequence_number)?,
                    weight: parse_field("weight", &k.weight)?,
                    revoked: k.revoked,
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        Ok(RemoteAccount { address, keys })
    }
}

fn parse_field<T: FromStr>(name: &str, value: &str) -> Result<T, ClientError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| ClientError::Decode(format!("Invalid {} '{}': {}", name, value, e)))
}
