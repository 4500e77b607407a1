//! Append-only record of the events every confirmed ledger call emitted.
//!
//! The ledger stays the system of record; the journal only remembers what
//! this gateway saw, which is where "your bets" gets choice and amount from.

use anyhow::Result;
use chrono::{DateTime, Utc};
use ethers::types::{Address, U256};
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::types::{LedgerEvent, Receipt, UserWager};

#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub tx_hash: String,
    pub event: LedgerEvent,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Journal {
    db: SqlitePool,
}

fn address_key(address: &Address) -> String {
    format!("{address:?}")
}

impl Journal {
    pub async fn connect(url: &str) -> Result<Self> {
        // An in-memory database lives and dies with its single connection.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?
        };

        let journal = Self { db: pool };
        journal.migrate().await?;
        Ok(journal)
    }

    /// Flush and close every connection; later writes fail.
    pub async fn close(&self) {
        self.db.close().await;
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_events (
                id TEXT PRIMARY KEY,
                tx_hash TEXT NOT NULL,
                kind TEXT NOT NULL,
                bet_id INTEGER NOT NULL,
                address TEXT,
                choice INTEGER,
                amount TEXT,
                payload TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS ledger_events_address
            ON ledger_events (address, kind)
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn record(&self, receipt: &Receipt) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.db.begin().await?;

        for event in &receipt.events {
            let (address, choice, amount) = match event {
                LedgerEvent::BetPlaced {
                    bettor,
                    choice,
                    amount,
                    ..
                } => (
                    Some(address_key(bettor)),
                    Some(*choice as i64),
                    Some(amount.to_string()),
                ),
                LedgerEvent::BetWinnerDeclared { winning_choice, .. } => {
                    (None, Some(*winning_choice as i64), None)
                }
                LedgerEvent::BetCreated { .. } => (None, None, None),
            };

            sqlx::query(
                r#"
                INSERT INTO ledger_events
                (id, tx_hash, kind, bet_id, address, choice, amount, payload, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&receipt.tx_hash)
            .bind(event.name())
            .bind(event.bet_id() as i64)
            .bind(address)
            .bind(choice)
            .bind(amount)
            .bind(serde_json::to_string(event)?)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn events_for_bet(&self, bet_id: u64) -> Result<Vec<JournalEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tx_hash, payload, recorded_at
            FROM ledger_events
            WHERE bet_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(bet_id as i64)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<JournalEntry> {
                let id: String = row.get("id");
                let payload: String = row.get("payload");
                let recorded_at: String = row.get("recorded_at");
                Ok(JournalEntry {
                    id: Uuid::parse_str(&id)?,
                    tx_hash: row.get("tx_hash"),
                    event: serde_json::from_str(&payload)?,
                    recorded_at: DateTime::parse_from_rfc3339(&recorded_at)?.with_timezone(&Utc),
                })
            })
            .collect()
    }

    pub async fn user_wagers(&self, address: Address) -> Result<Vec<UserWager>> {
        let rows = sqlx::query(
            r#"
            SELECT tx_hash, bet_id, choice, amount, recorded_at
            FROM ledger_events
            WHERE kind = 'BetPlaced' AND address = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(address_key(&address))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<UserWager> {
                let bet_id: i64 = row.get("bet_id");
                let choice: Option<i64> = row.get("choice");
                let amount: Option<String> = row.get("amount");
                let recorded_at: String = row.get("recorded_at");
                Ok(UserWager {
                    bet_id: bet_id as u64,
                    choice: choice.unwrap_or_default() as u64,
                    amount: U256::from_dec_str(amount.as_deref().unwrap_or("0"))
                        .map_err(|_| anyhow::anyhow!("corrupt amount for bet {bet_id}"))?,
                    tx_hash: row.get("tx_hash"),
                    recorded_at: DateTime::parse_from_rfc3339(&recorded_at)?.with_timezone(&Utc),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(bet_id: u64, bettor: Address, choice: u64, amount: u64) -> Receipt {
        Receipt {
            tx_hash: format!("0x{bet_id:064x}"),
            events: vec![LedgerEvent::BetPlaced {
                bet_id,
                bettor,
                choice,
                amount: U256::from(amount),
            }],
        }
    }

    #[tokio::test]
    async fn records_events_per_bet_in_order() {
        let journal = Journal::connect("sqlite::memory:").await.unwrap();

        let created = Receipt {
            tx_hash: "0xaa".into(),
            events: vec![LedgerEvent::BetCreated {
                id: 0,
                question: "Who will win?".into(),
                choices: vec!["A".into(), "B".into()],
            }],
        };
        journal.record(&created).await.unwrap();
        journal
            .record(&placed(0, Address::repeat_byte(1), 1, 500))
            .await
            .unwrap();
        journal
            .record(&placed(1, Address::repeat_byte(1), 0, 9))
            .await
            .unwrap();

        let entries = journal.events_for_bet(0).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.event.name()).collect();
        assert_eq!(names, vec!["BetCreated", "BetPlaced"]);
        assert_eq!(entries[0].tx_hash, "0xaa");
        assert_eq!(entries[0].event, created.events[0]);
    }

    #[tokio::test]
    async fn user_wagers_only_lists_that_bettor() {
        let journal = Journal::connect("sqlite::memory:").await.unwrap();
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);

        journal.record(&placed(0, alice, 1, 500)).await.unwrap();
        journal.record(&placed(0, bob, 0, 7)).await.unwrap();
        journal.record(&placed(3, alice, 0, 42)).await.unwrap();

        let wagers = journal.user_wagers(alice).await.unwrap();
        assert_eq!(wagers.len(), 2);
        assert_eq!((wagers[0].bet_id, wagers[0].choice), (0, 1));
        assert_eq!(wagers[0].amount, U256::from(500));
        assert_eq!(wagers[1].bet_id, 3);

        assert!(journal
            .user_wagers(Address::repeat_byte(9))
            .await
            .unwrap()
            .is_empty());
    }
}
