/// Balance ledger: where accrual credits land
///
/// The accrual loop only needs "add this amount to that member's balance",
/// so it talks to a [`BalanceLedger`] rather than to the database directly.
/// [`PgBalanceLedger`] is the production implementation; [`MemoryLedger`]
/// backs tests and local experiments.
///
/// Every implementation must apply a credit atomically with respect to other
/// credits for the same member. Concurrent accrual tasks for one member may
/// not lose each other's increments.
///
/// # Example
///
/// ```no_run
/// use gymtrack_worker::ledger::{BalanceLedger, PgBalanceLedger};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, member: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = PgBalanceLedger::new(pool);
/// let new_balance = ledger.credit(member, 0.000_555).await?;
/// println!("balance is now {:.4}", new_balance);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use gymtrack_shared::models::user::User;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Ledger error types
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The member was deleted while a session was open
    #[error("Unknown user: {0}")]
    UnknownUser(Uuid),

    /// Credits must be finite and non-negative
    #[error("Invalid credit amount: {0}")]
    InvalidAmount(f64),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Destination for balance credits
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// Adds `amount` to the member's balance and returns the new balance
    async fn credit(&self, user_id: Uuid, amount: f64) -> Result<f64, LedgerError>;
}

fn check_amount(amount: f64) -> Result<(), LedgerError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

/// Ledger backed by the `users.balance` column
#[derive(Clone)]
pub struct PgBalanceLedger {
    pool: PgPool,
}

impl PgBalanceLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceLedger for PgBalanceLedger {
    async fn credit(&self, user_id: Uuid, amount: f64) -> Result<f64, LedgerError> {
        check_amount(amount)?;

        User::credit_balance(&self.pool, user_id, amount)
            .await?
            .ok_or(LedgerError::UnknownUser(user_id))
    }
}

/// In-process ledger keyed by member id
///
/// Unknown members start at zero. [`MemoryLedger::fail_next`] makes the next
/// credits fail, for exercising error paths.
#[derive(Default)]
pub struct MemoryLedger {
    balances: Mutex<HashMap<Uuid, f64>>,
    failures_pending: Mutex<u32>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance, zero for members never credited
    pub fn balance(&self, user_id: Uuid) -> f64 {
        self.balances
            .lock()
            .map(|balances| balances.get(&user_id).copied().unwrap_or(0.0))
            .unwrap_or(0.0)
    }

    /// Makes the next `count` credits return [`LedgerError::Unavailable`]
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut pending) = self.failures_pending.lock() {
            *pending = count;
        }
    }
}

#[async_trait]
impl BalanceLedger for MemoryLedger {
    async fn credit(&self, user_id: Uuid, amount: f64) -> Result<f64, LedgerError> {
        check_amount(amount)?;

        {
            let mut pending = self
                .failures_pending
                .lock()
                .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
            if *pending > 0 {
                *pending -= 1;
                return Err(LedgerError::Unavailable("injected failure".to_string()));
            }
        }

        let mut balances = self
            .balances
            .lock()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        let balance = balances.entry(user_id).or_insert(0.0);
        *balance += amount;
        Ok(*balance)
    }
}
