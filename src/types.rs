use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Native currency amounts travel over JSON as decimal wei strings.
pub mod wei {
    use ethers::types::U256;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &U256, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(d)?;
        U256::from_dec_str(raw.trim())
            .map_err(|_| D::Error::custom(format!("invalid wei amount: {raw}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: u64,
    pub question: String,
    pub choices: Vec<String>,
    pub creator: Address,
    #[serde(with = "wei")]
    pub pot: U256,
    pub resolved: bool,
    pub winning_choice: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "args")]
pub enum LedgerEvent {
    BetCreated {
        id: u64,
        question: String,
        choices: Vec<String>,
    },
    BetPlaced {
        bet_id: u64,
        bettor: Address,
        choice: u64,
        #[serde(with = "wei")]
        amount: U256,
    },
    BetWinnerDeclared {
        bet_id: u64,
        winning_choice: u64,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::BetCreated { .. } => "BetCreated",
            LedgerEvent::BetPlaced { .. } => "BetPlaced",
            LedgerEvent::BetWinnerDeclared { .. } => "BetWinnerDeclared",
        }
    }

    pub fn bet_id(&self) -> u64 {
        match self {
            LedgerEvent::BetCreated { id, .. } => *id,
            LedgerEvent::BetPlaced { bet_id, .. } | LedgerEvent::BetWinnerDeclared { bet_id, .. } => {
                *bet_id
            }
        }
    }
}

/// Outcome of a state-changing ledger call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub events: Vec<LedgerEvent>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub address: Address,
}

#[derive(Deserialize)]
pub struct CreateBetRequest {
    pub caller: Address,
    pub question: String,
    pub choices: Vec<String>,
}

#[derive(Deserialize)]
pub struct PlaceBetRequest {
    pub caller: Address,
    pub choice: u64,
    #[serde(with = "wei")]
    pub amount: U256,
}

#[derive(Deserialize)]
pub struct DeclareWinnerRequest {
    pub caller: Address,
    pub choice: u64,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub address: Address,
    pub registered: bool,
    #[serde(with = "wei")]
    pub winnings: U256,
}

/// A wager as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWager {
    pub bet_id: u64,
    pub choice: u64,
    #[serde(with = "wei")]
    pub amount: U256,
    pub tx_hash: String,
    pub recorded_at: DateTime<Utc>,
}

/// An entry in the "your bets" list. `wager` is empty when the ledger
/// knows about a wager this gateway never saw being placed.
#[derive(Debug, Clone, Serialize)]
pub struct UserBet {
    pub bet: Bet,
    pub wager: Option<UserWager>,
}

#[derive(Debug, Serialize)]
pub struct WalletView {
    pub address: Address,
    pub registered: bool,
    pub newly_registered: bool,
}
