// src/eth/contract.rs

use ethers::contract::{ContractCall, EthLogDecode};
use ethers::types::{Address, U256};

use super::client::SignerClient;
use super::{BetContract, BetContractEvents};
use crate::error::LedgerError;
use crate::types::{Bet, LedgerEvent, Receipt};

/// Gas limit the front end has always attached to `createBet`.
pub const CREATE_BET_GAS: u64 = 3_000_000;

/// Forwards ledger calls to the deployed `BetContract`, signing as a single wallet.
pub struct BetContractLedger {
    contract: BetContract<SignerClient>,
    signer: Address,
}

fn remote<E: std::fmt::Display>(e: E) -> LedgerError {
    LedgerError::Remote(e.to_string())
}

fn to_u64(value: U256) -> Result<u64, LedgerError> {
    if value > U256::from(u64::MAX) {
        return Err(LedgerError::Remote(format!("{value} does not fit in u64")));
    }
    Ok(value.as_u64())
}

fn to_event(raw: BetContractEvents) -> Result<LedgerEvent, LedgerError> {
    Ok(match raw {
        BetContractEvents::BetCreatedFilter(e) => LedgerEvent::BetCreated {
            id: to_u64(e.id)?,
            question: e.question,
            choices: e.choices,
        },
        BetContractEvents::BetPlacedFilter(e) => LedgerEvent::BetPlaced {
            bet_id: to_u64(e.bet_id)?,
            bettor: e.bettor,
            choice: to_u64(e.choice)?,
            amount: e.amount,
        },
        BetContractEvents::BetWinnerDeclaredFilter(e) => LedgerEvent::BetWinnerDeclared {
            bet_id: to_u64(e.bet_id)?,
            winning_choice: to_u64(e.winning_choice)?,
        },
    })
}

impl BetContractLedger {
    pub fn new(contract: BetContract<SignerClient>, signer: Address) -> Self {
        Self { contract, signer }
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    fn ensure_signer(&self, caller: Address) -> Result<(), LedgerError> {
        if caller != self.signer {
            return Err(LedgerError::SignerMismatch);
        }
        Ok(())
    }

    async fn submit(&self, call: ContractCall<SignerClient, ()>) -> Result<Receipt, LedgerError> {
        let receipt = call
            .send()
            .await
            .map_err(remote)?
            .await
            .map_err(remote)?
            .ok_or_else(|| LedgerError::Remote("transaction dropped from mempool".into()))?;

        tracing::debug!(tx = ?receipt.transaction_hash, logs = receipt.logs.len(), "TX confirmed");

        let mut events = Vec::new();
        for log in receipt.logs {
            match BetContractEvents::decode_log(&log.into()) {
                Ok(raw) => events.push(to_event(raw)?),
                Err(e) => tracing::warn!("skipping undecodable log: {}", e),
            }
        }

        Ok(Receipt {
            tx_hash: format!("{:?}", receipt.transaction_hash),
            events,
        })
    }

    pub async fn register_user(&self, caller: Address) -> Result<Receipt, LedgerError> {
        self.ensure_signer(caller)?;
        self.submit(self.contract.register_user()).await
    }

    pub async fn registered_users(&self, address: Address) -> Result<bool, LedgerError> {
        self.contract
            .registered_users(address)
            .call()
            .await
            .map_err(remote)
    }

    pub async fn create_bet(
        &self,
        caller: Address,
        question: String,
        choices: Vec<String>,
    ) -> Result<Receipt, LedgerError> {
        self.ensure_signer(caller)?;
        let call = self.contract.create_bet(question, choices).gas(CREATE_BET_GAS);
        self.submit(call).await
    }

    pub async fn total_bets(&self) -> Result<u64, LedgerError> {
        let total = self.contract.total_bets().call().await.map_err(remote)?;
        to_u64(total)
    }

    pub async fn get_bet(&self, id: u64) -> Result<Bet, LedgerError> {
        let total = self.total_bets().await?;
        if id >= total {
            return Err(LedgerError::BetNotFound(id));
        }
        self.fetch_bet(id).await
    }

    /// `getBet` without the bounds check; callers already know `id < totalBets`.
    pub async fn fetch_bet(&self, id: u64) -> Result<Bet, LedgerError> {
        let (question, choices, creator, pot, resolved, winning_choice) = self
            .contract
            .get_bet(id.into())
            .call()
            .await
            .map_err(remote)?;

        Ok(Bet {
            id,
            question,
            choices,
            creator,
            pot,
            resolved,
            winning_choice: if resolved {
                Some(to_u64(winning_choice)?)
            } else {
                None
            },
        })
    }

    pub async fn user_bet_placed(&self, address: Address, bet_id: u64) -> Result<bool, LedgerError> {
        self.contract
            .user_bet_placed(address, bet_id.into())
            .call()
            .await
            .map_err(remote)
    }

    pub async fn place_bet(
        &self,
        caller: Address,
        bet_id: u64,
        choice: u64,
        value: U256,
    ) -> Result<Receipt, LedgerError> {
        self.ensure_signer(caller)?;
        let call = self
            .contract
            .place_bet(bet_id.into(), choice.into())
            .value(value);
        self.submit(call).await
    }

    pub async fn declare_winner(
        &self,
        caller: Address,
        bet_id: u64,
        winning_choice: u64,
    ) -> Result<Receipt, LedgerError> {
        self.ensure_signer(caller)?;
        let call = self
            .contract
            .declare_winner(bet_id.into(), winning_choice.into());
        self.submit(call).await
    }

    pub async fn winnings(&self, address: Address) -> Result<U256, LedgerError> {
        self.contract.winnings(address).call().await.map_err(remote)
    }
}
