//! The prediction-market ledger the gateway forwards calls to.

use std::sync::Arc;

use ethers::types::{Address, U256};

use crate::error::LedgerError;
use crate::eth::contract::BetContractLedger;
use crate::types::{Bet, Receipt};

pub mod memory;

pub use memory::MemoryLedger;

#[derive(Clone)]
pub enum Ledger {
    Memory(MemoryLedger),
    Contract(Arc<BetContractLedger>),
}

impl Ledger {
    /// Address that signs transactions, when the backend has one. The
    /// in-process ledger trusts whichever caller the request names.
    pub fn signer(&self) -> Option<Address> {
        match self {
            Ledger::Memory(_) => None,
            Ledger::Contract(c) => Some(c.signer()),
        }
    }

    pub async fn register_user(&self, caller: Address) -> Result<Receipt, LedgerError> {
        match self {
            Ledger::Memory(m) => m.register_user(caller),
            Ledger::Contract(c) => c.register_user(caller).await,
        }
    }

    pub async fn registered_users(&self, address: Address) -> Result<bool, LedgerError> {
        match self {
            Ledger::Memory(m) => Ok(m.registered_users(address)),
            Ledger::Contract(c) => c.registered_users(address).await,
        }
    }

    pub async fn create_bet(
        &self,
        caller: Address,
        question: String,
        choices: Vec<String>,
    ) -> Result<Receipt, LedgerError> {
        match self {
            Ledger::Memory(m) => m.create_bet(caller, question, choices),
            Ledger::Contract(c) => c.create_bet(caller, question, choices).await,
        }
    }

    pub async fn total_bets(&self) -> Result<u64, LedgerError> {
        match self {
            Ledger::Memory(m) => Ok(m.total_bets()),
            Ledger::Contract(c) => c.total_bets().await,
        }
    }

    pub async fn get_bet(&self, id: u64) -> Result<Bet, LedgerError> {
        match self {
            Ledger::Memory(m) => m.get_bet(id),
            Ledger::Contract(c) => c.get_bet(id).await,
        }
    }

    pub async fn user_bet_placed(&self, address: Address, bet_id: u64) -> Result<bool, LedgerError> {
        match self {
            Ledger::Memory(m) => Ok(m.user_bet_placed(address, bet_id)),
            Ledger::Contract(c) => c.user_bet_placed(address, bet_id).await,
        }
    }

    pub async fn place_bet(
        &self,
        caller: Address,
        bet_id: u64,
        choice: u64,
        value: U256,
    ) -> Result<Receipt, LedgerError> {
        match self {
            Ledger::Memory(m) => m.place_bet(caller, bet_id, choice, value),
            Ledger::Contract(c) => c.place_bet(caller, bet_id, choice, value).await,
        }
    }

    pub async fn declare_winner(
        &self,
        caller: Address,
        bet_id: u64,
        winning_choice: u64,
    ) -> Result<Receipt, LedgerError> {
        match self {
            Ledger::Memory(m) => m.declare_winner(caller, bet_id, winning_choice),
            Ledger::Contract(c) => c.declare_winner(caller, bet_id, winning_choice).await,
        }
    }

    pub async fn winnings(&self, address: Address) -> Result<U256, LedgerError> {
        match self {
            Ledger::Memory(m) => Ok(m.winnings(address)),
            Ledger::Contract(c) => c.winnings(address).await,
        }
    }

    /// Every bet in id order: `totalBets` followed by one `getBet` per id.
    pub async fn load_bets(&self) -> Result<Vec<Bet>, LedgerError> {
        let total = self.total_bets().await?;
        let mut bets = Vec::new();
        for id in 0..total {
            let bet = match self {
                Ledger::Memory(m) => m.get_bet(id)?,
                Ledger::Contract(c) => c.fetch_bet(id).await?,
            };
            bets.push(bet);
        }
        Ok(bets)
    }
}
