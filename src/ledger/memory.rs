//! In-process ledger reproducing the observable behaviour of `BetContract`.
//!
//! All transitions run under one mutex, the way the chain serializes
//! transactions. Payout is parimutuel: every wager on the winning choice
//! receives `amount * pot / winning_side_total`, credited to `winnings` and
//! paid to the bettor's balance when the winner is declared. Division dust,
//! and the whole pot when nobody picked the winner, stay with the ledger.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ethers::types::{Address, U256};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::LedgerError;
use crate::types::{Bet, LedgerEvent, Receipt};

#[derive(Debug, Clone, Copy)]
struct Wager {
    choice: u64,
    amount: U256,
}

#[derive(Default)]
struct Book {
    nonce: u64,
    registered: HashSet<Address>,
    bets: Vec<Bet>,
    wagers: HashMap<(Address, u64), Wager>,
    winnings: HashMap<Address, U256>,
    balances: HashMap<Address, U256>,
    held: U256,
}

impl Book {
    fn bet(&self, id: u64) -> Result<&Bet, LedgerError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.bets.get(idx))
            .ok_or(LedgerError::BetNotFound(id))
    }

    fn bet_mut(&mut self, id: u64) -> Result<&mut Bet, LedgerError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.bets.get_mut(idx))
            .ok_or(LedgerError::BetNotFound(id))
    }

    fn balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    fn receipt(
        &mut self,
        method: &str,
        caller: Address,
        args: &str,
        events: Vec<LedgerEvent>,
    ) -> Receipt {
        self.nonce += 1;

        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(method.as_bytes());
        hasher.update(caller.as_bytes());
        hasher.update(args.as_bytes());

        Receipt {
            tx_hash: format!("0x{}", hex::encode(hasher.finalize())),
            events,
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryLedger {
    book: Arc<Mutex<Book>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger whose wallets start with the given balances.
    pub fn with_accounts(accounts: &[(Address, U256)]) -> Self {
        let ledger = Self::new();
        for (address, amount) in accounts {
            ledger.fund(*address, *amount);
        }
        ledger
    }

    pub fn fund(&self, address: Address, amount: U256) {
        let mut book = self.book.lock();
        let balance = book.balance(address).saturating_add(amount);
        book.balances.insert(address, balance);
    }

    pub fn balance_of(&self, address: Address) -> U256 {
        self.book.lock().balance(address)
    }

    /// Value escrowed and not yet paid out.
    pub fn ledger_balance(&self) -> U256 {
        self.book.lock().held
    }

    pub fn register_user(&self, caller: Address) -> Result<Receipt, LedgerError> {
        let mut book = self.book.lock();
        if !book.registered.insert(caller) {
            return Err(LedgerError::AlreadyRegistered);
        }
        Ok(book.receipt("registerUser", caller, "", Vec::new()))
    }

    pub fn registered_users(&self, address: Address) -> bool {
        self.book.lock().registered.contains(&address)
    }

    pub fn create_bet(
        &self,
        caller: Address,
        question: String,
        choices: Vec<String>,
    ) -> Result<Receipt, LedgerError> {
        if question.trim().is_empty() {
            return Err(LedgerError::EmptyQuestion);
        }
        if choices.len() < 2 {
            return Err(LedgerError::TooFewChoices);
        }
        if choices.iter().any(|c| c.trim().is_empty()) {
            return Err(LedgerError::EmptyChoice);
        }

        let mut book = self.book.lock();
        let id = book.bets.len() as u64;
        book.bets.push(Bet {
            id,
            question: question.clone(),
            choices: choices.clone(),
            creator: caller,
            pot: U256::zero(),
            resolved: false,
            winning_choice: None,
        });

        let args = format!("{}|{}", question, choices.join("|"));
        let event = LedgerEvent::BetCreated {
            id,
            question,
            choices,
        };
        Ok(book.receipt("createBet", caller, &args, vec![event]))
    }

    pub fn total_bets(&self) -> u64 {
        self.book.lock().bets.len() as u64
    }

    pub fn get_bet(&self, id: u64) -> Result<Bet, LedgerError> {
        self.book.lock().bet(id).cloned()
    }

    pub fn user_bet_placed(&self, address: Address, bet_id: u64) -> bool {
        self.book.lock().wagers.contains_key(&(address, bet_id))
    }

    pub fn place_bet(
        &self,
        caller: Address,
        bet_id: u64,
        choice: u64,
        value: U256,
    ) -> Result<Receipt, LedgerError> {
        let mut book = self.book.lock();

        if !book.registered.contains(&caller) {
            return Err(LedgerError::NotRegistered);
        }
        if value.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }

        let bet = book.bet(bet_id)?;
        if bet.resolved {
            return Err(LedgerError::BetResolved(bet_id));
        }
        if choice >= bet.choices.len() as u64 {
            return Err(LedgerError::InvalidChoice { bet_id, choice });
        }
        if book.wagers.contains_key(&(caller, bet_id)) {
            return Err(LedgerError::AlreadyWagered(bet_id));
        }

        let balance = book.balance(caller);
        if balance < value {
            return Err(LedgerError::InsufficientFunds);
        }

        book.balances.insert(caller, balance - value);
        book.held = book.held.saturating_add(value);
        let bet = book.bet_mut(bet_id)?;
        bet.pot = bet.pot.saturating_add(value);
        book.wagers.insert(
            (caller, bet_id),
            Wager {
                choice,
                amount: value,
            },
        );

        let args = format!("{bet_id}|{choice}|{value}");
        let event = LedgerEvent::BetPlaced {
            bet_id,
            bettor: caller,
            choice,
            amount: value,
        };
        Ok(book.receipt("placeBet", caller, &args, vec![event]))
    }

    pub fn declare_winner(
        &self,
        caller: Address,
        bet_id: u64,
        winning_choice: u64,
    ) -> Result<Receipt, LedgerError> {
        let mut book = self.book.lock();

        let bet = book.bet(bet_id)?;
        if bet.resolved {
            return Err(LedgerError::BetResolved(bet_id));
        }
        if winning_choice >= bet.choices.len() as u64 {
            return Err(LedgerError::InvalidChoice {
                bet_id,
                choice: winning_choice,
            });
        }
        if bet.creator != caller {
            return Err(LedgerError::NotBetCreator(bet_id));
        }
        let pot = bet.pot;

        let winners: Vec<(Address, U256)> = book
            .wagers
            .iter()
            .filter(|((_, id), w)| *id == bet_id && w.choice == winning_choice)
            .map(|((bettor, _), w)| (*bettor, w.amount))
            .collect();
        let winning_total = winners
            .iter()
            .fold(U256::zero(), |acc, (_, amount)| acc.saturating_add(*amount));

        // Compute every payout before touching balances so an overflow leaves the book untouched.
        let mut payouts = Vec::with_capacity(winners.len());
        for (bettor, amount) in winners {
            let share = amount
                .checked_mul(pot)
                .ok_or_else(|| LedgerError::InvalidAmount("payout overflow".into()))?
                / winning_total;
            payouts.push((bettor, share));
        }

        for (bettor, payout) in payouts {
            let credited = book
                .winnings
                .get(&bettor)
                .copied()
                .unwrap_or_default()
                .saturating_add(payout);
            book.winnings.insert(bettor, credited);

            let balance = book.balance(bettor).saturating_add(payout);
            book.balances.insert(bettor, balance);
            book.held = book.held.saturating_sub(payout);
        }

        let bet = book.bet_mut(bet_id)?;
        bet.resolved = true;
        bet.winning_choice = Some(winning_choice);

        let args = format!("{bet_id}|{winning_choice}");
        let event = LedgerEvent::BetWinnerDeclared {
            bet_id,
            winning_choice,
        };
        Ok(book.receipt("declareWinner", caller, &args, vec![event]))
    }

    pub fn winnings(&self, address: Address) -> U256 {
        self.book
            .lock()
            .winnings
            .get(&address)
            .copied()
            .unwrap_or_default()
    }
}
