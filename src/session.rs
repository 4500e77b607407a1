//! View state for one connected browser.
//!
//! A `Session` is a plain value; every user action is a named `Transition`
//! that produces the next value.

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Bet, UserBet, wei};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub wallet: Option<Address>,
    pub selected_bet: Option<u64>,
    pub selected_choice: Option<u64>,
    #[serde(with = "wei")]
    pub bet_amount: U256,
    pub create_modal_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Only produced by the connect flow, after registration is settled.
    #[serde(skip_deserializing)]
    Connected(Address),
    SelectBet {
        bet_id: u64,
    },
    ClearSelection,
    ChooseChoice {
        choice: u64,
    },
    SetAmount {
        #[serde(with = "wei")]
        amount: U256,
    },
    OpenCreateModal,
    CloseCreateModal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Connect a wallet first")]
    NoWallet,

    #[error("Select a bet first")]
    NoBetSelected,

    #[error("Select a choice first")]
    NoChoiceSelected,
}

/// Everything `placeBet` needs, taken from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceBetForm {
    pub caller: Address,
    pub bet_id: u64,
    pub choice: u64,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclareForm {
    pub caller: Address,
    pub bet_id: u64,
    pub winning_choice: u64,
}

impl Session {
    pub fn apply(self, transition: Transition) -> Session {
        match transition {
            Transition::Connected(address) => Session {
                wallet: Some(address),
                ..self
            },
            Transition::SelectBet { bet_id } => Session {
                selected_bet: Some(bet_id),
                selected_choice: None,
                bet_amount: U256::zero(),
                ..self
            },
            Transition::ClearSelection => Session {
                selected_bet: None,
                selected_choice: None,
                bet_amount: U256::zero(),
                ..self
            },
            Transition::ChooseChoice { choice } => Session {
                selected_choice: Some(choice),
                ..self
            },
            Transition::SetAmount { amount } => Session {
                bet_amount: amount,
                ..self
            },
            Transition::OpenCreateModal => Session {
                create_modal_open: true,
                ..self
            },
            Transition::CloseCreateModal => Session {
                create_modal_open: false,
                ..self
            },
        }
    }

    pub fn wallet(&self) -> Result<Address, SessionError> {
        self.wallet.ok_or(SessionError::NoWallet)
    }

    fn selection(&self) -> Result<(Address, u64, u64), SessionError> {
        let caller = self.wallet()?;
        let bet_id = self.selected_bet.ok_or(SessionError::NoBetSelected)?;
        let choice = self.selected_choice.ok_or(SessionError::NoChoiceSelected)?;
        Ok((caller, bet_id, choice))
    }

    /// The amount goes through as entered; the ledger decides whether it is acceptable.
    pub fn wager(&self) -> Result<PlaceBetForm, SessionError> {
        let (caller, bet_id, choice) = self.selection()?;
        Ok(PlaceBetForm {
            caller,
            bet_id,
            choice,
            amount: self.bet_amount,
        })
    }

    pub fn declaration(&self) -> Result<DeclareForm, SessionError> {
        let (caller, bet_id, winning_choice) = self.selection()?;
        Ok(DeclareForm {
            caller,
            bet_id,
            winning_choice,
        })
    }
}

/// The create-bet dialog: a question and the raw comma-separated choices.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBetForm {
    pub question: String,
    pub choices: String,
}

impl CreateBetForm {
    /// Splits on commas and keeps every piece exactly as typed.
    pub fn parse(self) -> (String, Vec<String>) {
        let choices = self.choices.split(',').map(String::from).collect();
        (self.question, choices)
    }
}

/// What a connected browser renders: all bets newest first and the bets the wallet joined.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
    pub bets: Vec<Bet>,
    pub user_bets: Vec<UserBet>,
}

/// Bets as loaded are in id order; the board shows the newest first.
pub fn newest_first(mut bets: Vec<Bet>) -> Vec<Bet> {
    bets.reverse();
    bets
}
