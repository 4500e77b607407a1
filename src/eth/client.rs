// src/eth/client.rs

use anyhow::{Context, Result};
use ethers::prelude::*;
use std::sync::Arc;

use super::BetContract;
use crate::config::ContractSettings;

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Contract handle plus the address its transactions are signed with.
pub fn bet_contract(settings: &ContractSettings) -> Result<(BetContract<SignerClient>, Address)> {
    let provider = Provider::<Http>::try_from(settings.rpc_url.as_str())
        .with_context(|| format!("invalid RPC_URL {}", settings.rpc_url))?;
    let wallet: LocalWallet = settings
        .private_key
        .parse()
        .context("PRIVATE_KEY is not a valid secp256k1 key")?;

    let wallet = wallet.with_chain_id(settings.chain_id);
    let signer = wallet.address();

    let client = SignerMiddleware::new(provider, wallet);
    let client = Arc::new(client);

    Ok((BetContract::new(settings.contract_address, client), signer))
}
