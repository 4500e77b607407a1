use axum::http::StatusCode;
use thiserror::Error;

/// Every way a ledger call can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("User is already registered")]
    AlreadyRegistered,

    #[error("User is not registered")]
    NotRegistered,

    #[error("Bet {0} not found")]
    BetNotFound(u64),

    #[error("Choice {choice} is not valid for bet {bet_id}")]
    InvalidChoice { bet_id: u64, choice: u64 },

    #[error("A bet needs at least two choices")]
    TooFewChoices,

    #[error("Question must not be empty")]
    EmptyQuestion,

    #[error("Choices must not be empty")]
    EmptyChoice,

    #[error("Bet {0} is already resolved")]
    BetResolved(u64),

    #[error("A wager on bet {0} was already placed by this address")]
    AlreadyWagered(u64),

    #[error("Wager amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Only the creator of bet {0} may declare its winner")]
    NotBetCreator(u64),

    #[error("Caller does not match the configured signer")]
    SignerMismatch,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Ledger call failed: {0}")]
    Remote(String),
}

impl LedgerError {
    pub fn status(&self) -> StatusCode {
        match self {
            LedgerError::BetNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::SignerMismatch | LedgerError::NotBetCreator(_) => StatusCode::FORBIDDEN,
            LedgerError::AlreadyRegistered
            | LedgerError::BetResolved(_)
            | LedgerError::AlreadyWagered(_) => StatusCode::CONFLICT,
            LedgerError::Remote(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Shape used by every handler's error arm.
pub fn reject(e: LedgerError) -> (StatusCode, String) {
    (e.status(), e.to_string())
}
