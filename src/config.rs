use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ethers::types::{Address, U256};

pub struct ContractSettings {
    pub rpc_url: String,
    pub private_key: String,
    pub contract_address: Address,
    pub chain_id: u64,
}

impl fmt::Debug for ContractSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractSettings")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

#[derive(Debug)]
pub enum LedgerBackend {
    /// In-process ledger, wallets seeded with the listed balances.
    Memory { accounts: Vec<(Address, U256)> },
    Contract(ContractSettings),
}

#[derive(Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub refresh_interval: Duration,
    /// Sessions untouched for this long are dropped by the refresher.
    pub session_idle: Duration,
    pub backend: LedgerBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr = var("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let database_url = var("DATABASE_URL").unwrap_or_else(|| "sqlite::memory:".to_string());

        let refresh_secs: u64 = match var("REFRESH_INTERVAL_SECS") {
            Some(raw) => raw
                .parse()
                .context("REFRESH_INTERVAL_SECS must be a number of seconds")?,
            None => 10,
        };

        let idle_secs: u64 = match var("SESSION_IDLE_SECS") {
            Some(raw) => raw
                .parse()
                .context("SESSION_IDLE_SECS must be a number of seconds")?,
            None => 1800,
        };

        let backend = match var("LEDGER_BACKEND").as_deref().unwrap_or("memory") {
            "memory" => LedgerBackend::Memory {
                accounts: parse_accounts(&var("DEV_ACCOUNTS").unwrap_or_default())?,
            },
            "contract" => {
                let required = |key: &str| var(key).with_context(|| format!("{key} must be set"));
                LedgerBackend::Contract(ContractSettings {
                    rpc_url: required("RPC_URL")?,
                    private_key: required("PRIVATE_KEY")?,
                    contract_address: required("CONTRACT_ADDRESS")?
                        .parse()
                        .context("CONTRACT_ADDRESS must be a 0x address")?,
                    chain_id: required("CHAIN_ID")?
                        .parse()
                        .context("CHAIN_ID must be a number")?,
                })
            }
            other => bail!("unknown LEDGER_BACKEND {other:?} (expected memory or contract)"),
        };

        Ok(Self {
            bind_addr,
            database_url,
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            session_idle: Duration::from_secs(idle_secs),
            backend,
        })
    }
}

/// `0xabc..=1000000000000000000,0xdef..=5` into seeded balances.
fn parse_accounts(raw: &str) -> Result<Vec<(Address, U256)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (address, amount) = entry
                .split_once('=')
                .with_context(|| format!("DEV_ACCOUNTS entry {entry:?} is not address=wei"))?;
            let address: Address = address
                .trim()
                .parse()
                .with_context(|| format!("bad address in DEV_ACCOUNTS: {address}"))?;
            let amount = U256::from_dec_str(amount.trim())
                .map_err(|_| anyhow::anyhow!("bad wei amount in DEV_ACCOUNTS: {amount}"))?;
            Ok((address, amount))
        })
        .collect()
}
