use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::journal::Journal;
use crate::ledger::Ledger;
use crate::session::{Session, Transition, newest_first};
use crate::types::{Bet, Receipt};

struct SessionSlot {
    session: Session,
    last_seen: Instant,
}

impl SessionSlot {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_seen: Instant::now(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    pub journal: Journal,
    /// Last loaded bet list, newest first.
    pub board: Arc<RwLock<Vec<Bet>>>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
    /// Held for the whole load-and-store so reloads land in the order they started.
    reload: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(ledger: Ledger, journal: Journal) -> Self {
        Self {
            ledger,
            journal,
            board: Arc::new(RwLock::new(Vec::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            reload: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Reload every bet from the ledger into the board.
    pub async fn refresh_board(&self) -> Result<usize, LedgerError> {
        let _reload = self.reload.lock().await;
        let bets = self.ledger.load_bets().await?;
        let count = bets.len();
        *self.board.write() = newest_first(bets);
        Ok(count)
    }

    pub fn bets(&self) -> Vec<Bet> {
        self.board.read().clone()
    }

    /// Bookkeeping after a confirmed call. Neither step can undo the call,
    /// so failures are logged and swallowed.
    pub async fn after_call(&self, receipt: &Receipt) {
        if let Err(e) = self.journal.record(receipt).await {
            tracing::error!("Journal write failed for {}: {:?}", receipt.tx_hash, e);
        }
        if let Err(e) = self.refresh_board().await {
            tracing::warn!("Bet list reload failed: {}", e);
        }
    }

    pub fn open_session(&self) -> (Uuid, Session) {
        let id = Uuid::new_v4();
        let session = Session::default();
        self.sessions
            .write()
            .insert(id, SessionSlot::new(session.clone()));
        (id, session)
    }

    /// Current value of a session; reading it counts as activity.
    pub fn session(&self, id: Uuid) -> Option<Session> {
        let mut sessions = self.sessions.write();
        let slot = sessions.get_mut(&id)?;
        slot.last_seen = Instant::now();
        Some(slot.session.clone())
    }

    /// Apply a transition to whatever the session holds now, not to a copy
    /// taken before an await.
    pub fn update_session(&self, id: Uuid, transition: Transition) -> Option<Session> {
        let mut sessions = self.sessions.write();
        let slot = sessions.get_mut(&id)?;
        slot.session = slot.session.clone().apply(transition);
        slot.last_seen = Instant::now();
        Some(slot.session.clone())
    }

    pub fn close_session(&self, id: Uuid) -> bool {
        self.sessions.write().remove(&id).is_some()
    }

    /// Drop sessions nobody has touched for `max_idle`. Returns how many went.
    pub fn evict_idle_sessions(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, slot| slot.last_seen.elapsed() < max_idle);
        before - sessions.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use ethers::types::Address;

    async fn test_state() -> (AppState, MemoryLedger) {
        let memory = MemoryLedger::new();
        let journal = Journal::connect("sqlite::memory:").await.unwrap();
        (AppState::new(Ledger::Memory(memory.clone()), journal), memory)
    }

    #[tokio::test]
    async fn update_session_applies_to_current_value() {
        let (state, _) = test_state().await;
        let (id, stale) = state.open_session();

        state.update_session(id, Transition::SelectBet { bet_id: 7 });
        let wallet = Address::repeat_byte(3);
        let current = state
            .update_session(id, Transition::Connected(wallet))
            .unwrap();

        assert_eq!(stale, Session::default());
        assert_eq!(current.wallet, Some(wallet));
        assert_eq!(current.selected_bet, Some(7));
        assert!(state.update_session(Uuid::new_v4(), Transition::ClearSelection).is_none());
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let (state, _) = test_state().await;
        let (first, _) = state.open_session();
        state.open_session();
        assert_eq!(state.session_count(), 2);

        assert_eq!(state.evict_idle_sessions(Duration::from_secs(3600)), 0);
        assert!(state.close_session(first));
        assert!(!state.close_session(first));

        assert_eq!(state.evict_idle_sessions(Duration::ZERO), 1);
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_reloads_leave_the_full_board() {
        let (state, memory) = test_state().await;
        let caller = Address::repeat_byte(9);
        state.refresh_board().await.unwrap();

        memory
            .create_bet(caller, "late?".into(), vec!["a".into(), "b".into()])
            .unwrap();
        let (a, b) = tokio::join!(state.refresh_board(), state.refresh_board());

        assert_eq!((a.unwrap(), b.unwrap()), (1, 1));
        assert_eq!(state.bets().len(), 1);
        assert_eq!(state.bets()[0].question, "late?");
    }
}
