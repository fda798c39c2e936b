/// Accrual supervisor
///
/// Owns every running accrual loop, keyed by the usage record that started
/// it. Opening a session calls [`AccrualSupervisor::spawn`]; closing it calls
/// [`AccrualSupervisor::cancel`] with the same record id. Loops that run out
/// of ticks remove themselves.
///
/// All loops hang off one root token, so [`AccrualSupervisor::shutdown`]
/// stops them together and waits for them to finish.
///
/// # Example
///
/// ```no_run
/// use gymtrack_worker::accrual::AccrualPolicy;
/// use gymtrack_worker::ledger::PgBalanceLedger;
/// use gymtrack_worker::supervisor::AccrualSupervisor;
/// use sqlx::PgPool;
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, member: Uuid, usage_id: Uuid) {
/// let supervisor = AccrualSupervisor::new(
///     Arc::new(PgBalanceLedger::new(pool)),
///     AccrualPolicy::default(),
/// );
///
/// supervisor.spawn(usage_id, member).await;
/// // ... member ends the session
/// supervisor.cancel(usage_id).await;
///
/// // register first, then create the record under the same id
/// let created: Result<Uuid, sqlx::Error> = supervisor
///     .spawn_for_new_record(member, |id| async move { Ok(id) })
///     .await;
///
/// supervisor.shutdown().await;
/// # }
/// ```

use crate::accrual::{run_accrual, AccrualOutcome, AccrualPolicy};
use crate::ledger::BalanceLedger;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct ActiveAccrual {
    /// Distinguishes a loop from a later one registered under the same usage id
    run_id: Uuid,
    user_id: Uuid,
    cancel_token: CancellationToken,
    handle: JoinHandle<AccrualOutcome>,
}

/// Registry of running accrual loops
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct AccrualSupervisor {
    ledger: Arc<dyn BalanceLedger>,
    policy: AccrualPolicy,
    tasks: Arc<Mutex<HashMap<Uuid, ActiveAccrual>>>,
    root_token: CancellationToken,
}

impl AccrualSupervisor {
    pub fn new(ledger: Arc<dyn BalanceLedger>, policy: AccrualPolicy) -> Self {
        Self {
            ledger,
            policy,
            tasks: Arc::new(Mutex::new(HashMap::new())),
            root_token: CancellationToken::new(),
        }
    }

    pub fn policy(&self) -> &AccrualPolicy {
        &self.policy
    }

    /// Starts accruing for `user_id`, bound to usage record `usage_id`
    ///
    /// If a loop is already registered under `usage_id` it is cancelled and
    /// replaced. After [`shutdown`](Self::shutdown) this does nothing.
    pub async fn spawn(&self, usage_id: Uuid, user_id: Uuid) {
        if self.root_token.is_cancelled() {
            tracing::warn!(usage_id = %usage_id, "Supervisor is shut down, accrual not started");
            return;
        }

        let cancel_token = self.root_token.child_token();
        let run_id = Uuid::new_v4();

        // held across the spawn so the task cannot deregister before it is registered
        let mut tasks = self.tasks.lock().await;

        let handle = {
            let ledger = self.ledger.clone();
            let policy = self.policy.clone();
            let registry = self.tasks.clone();
            let token = cancel_token.clone();

            tokio::spawn(async move {
                let outcome = run_accrual(ledger.as_ref(), user_id, usage_id, &policy, token).await;

                // a cancel or a replacement may already have taken the slot
                let mut tasks = registry.lock().await;
                if tasks.get(&usage_id).map(|a| a.run_id) == Some(run_id) {
                    tasks.remove(&usage_id);
                }

                outcome
            })
        };

        if let Some(previous) = tasks.insert(
            usage_id,
            ActiveAccrual {
                run_id,
                user_id,
                cancel_token,
                handle,
            },
        ) {
            tracing::warn!(usage_id = %usage_id, "Replacing existing accrual loop");
            previous.cancel_token.cancel();
        }

        tracing::info!(
            usage_id = %usage_id,
            user_id = %user_id,
            active = tasks.len(),
            "Accrual loop spawned"
        );
    }

    /// Registers a loop under a fresh record id, then runs `insert` with it
    ///
    /// The loop is in the registry before the record exists, so a
    /// [`cancel`](Self::cancel) for the record cannot arrive ahead of it.
    /// If `insert` fails the loop is cancelled before the error is returned.
    /// The loop sleeps a full interval before its first credit.
    pub async fn spawn_for_new_record<T, E, F, Fut>(&self, user_id: Uuid, insert: F) -> Result<T, E>
    where
        F: FnOnce(Uuid) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let usage_id = Uuid::new_v4();
        self.spawn(usage_id, user_id).await;

        match insert(usage_id).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(usage_id = %usage_id, "Record insert failed, dropping accrual loop");
                self.cancel(usage_id).await;
                Err(e)
            }
        }
    }

    /// Stops the loop bound to `usage_id`
    ///
    /// Returns false if no loop was running for it (already finished, or never
    /// started).
    pub async fn cancel(&self, usage_id: Uuid) -> bool {
        match self.tasks.lock().await.remove(&usage_id) {
            Some(active) => {
                active.cancel_token.cancel();
                tracing::info!(
                    usage_id = %usage_id,
                    user_id = %active.user_id,
                    "Accrual loop cancelled"
                );
                true
            }
            None => {
                tracing::debug!(usage_id = %usage_id, "No accrual loop to cancel");
                false
            }
        }
    }

    /// Stops the loop bound to `usage_id` and waits for its outcome
    pub async fn cancel_and_join(&self, usage_id: Uuid) -> Option<AccrualOutcome> {
        let active = self.tasks.lock().await.remove(&usage_id)?;
        active.cancel_token.cancel();

        match active.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(usage_id = %usage_id, error = %e, "Accrual loop panicked");
                None
            }
        }
    }

    /// Whether a loop is registered for `usage_id`
    pub async fn is_active(&self, usage_id: Uuid) -> bool {
        self.tasks.lock().await.contains_key(&usage_id)
    }

    /// Number of registered loops
    pub async fn active_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Cancels every loop and waits for all of them
    ///
    /// Later calls to [`spawn`](Self::spawn) are ignored.
    pub async fn shutdown(&self) {
        self.root_token.cancel();

        let drained: Vec<(Uuid, ActiveAccrual)> = self.tasks.lock().await.drain().collect();
        tracing::info!(count = drained.len(), "Stopping accrual loops");

        for (usage_id, active) in drained {
            if let Err(e) = active.handle.await {
                tracing::error!(usage_id = %usage_id, error = %e, "Accrual loop panicked");
            }
        }

        tracing::info!("All accrual loops stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use std::time::Duration;
    use tokio::time::sleep;

    fn supervisor_with(ledger: Arc<MemoryLedger>) -> AccrualSupervisor {
        AccrualSupervisor::new(ledger, AccrualPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_registers_and_finished_loop_deregisters() {
        let ledger = Arc::new(MemoryLedger::new());
        let supervisor = supervisor_with(ledger.clone());
        let member = Uuid::new_v4();
        let usage_id = Uuid::new_v4();

        supervisor.spawn(usage_id, member).await;
        assert!(supervisor.is_active(usage_id).await);
        assert_eq!(supervisor.active_count().await, 1);

        // past the 60s tick limit
        sleep(Duration::from_secs(61)).await;

        assert!(!supervisor.is_active(usage_id).await);
        assert_eq!(supervisor.active_count().await, 0);
        assert!((ledger.balance(member) - supervisor.policy().max_total()).abs() < 1e-12);
        assert!(!supervisor.cancel(usage_id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_ends_accrual_for_that_session_only() {
        let ledger = Arc::new(MemoryLedger::new());
        let supervisor = supervisor_with(ledger.clone());
        let member = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        supervisor.spawn(first, member).await;
        supervisor.spawn(second, member).await;

        sleep(Duration::from_secs(5)).await;
        let outcome = supervisor.cancel_and_join(first).await.unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.ticks, 2);

        assert!(!supervisor.is_active(first).await);
        assert!(supervisor.is_active(second).await);

        sleep(Duration::from_secs(60)).await;

        // 2 ticks from the cancelled session plus the full 30 from the other
        let expected = 32.0 * supervisor.policy().increment();
        assert!((ledger.balance(member) - expected).abs() < 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_unknown_session() {
        let supervisor = supervisor_with(Arc::new(MemoryLedger::new()));
        assert!(!supervisor.cancel(Uuid::new_v4()).await);
        assert!(supervisor.cancel_and_join(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_right_after_insert_stops_accrual() {
        let ledger = Arc::new(MemoryLedger::new());
        let supervisor = supervisor_with(ledger.clone());
        let member = Uuid::new_v4();

        // an end request closing the record before the start handler returns
        let ender = supervisor.clone();
        let (usage_id, cancel_found) = supervisor
            .spawn_for_new_record(member, |id| async move {
                let found = ender.cancel(id).await;
                Ok::<_, ()>((id, found))
            })
            .await
            .unwrap();

        assert!(cancel_found);
        assert!(!supervisor.is_active(usage_id).await);

        sleep(Duration::from_secs(61)).await;
        assert_eq!(ledger.balance(member), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_insert_drops_accrual() {
        let ledger = Arc::new(MemoryLedger::new());
        let supervisor = supervisor_with(ledger.clone());
        let member = Uuid::new_v4();

        let result: Result<(), &str> = supervisor
            .spawn_for_new_record(member, |_| async { Err("insert failed") })
            .await;

        assert_eq!(result, Err("insert failed"));
        assert_eq!(supervisor.active_count().await, 0);

        sleep(Duration::from_secs(61)).await;
        assert_eq!(ledger.balance(member), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_record_loop_accrues_until_cancelled() {
        let ledger = Arc::new(MemoryLedger::new());
        let supervisor = supervisor_with(ledger.clone());
        let member = Uuid::new_v4();

        let usage_id = supervisor
            .spawn_for_new_record(member, |id| async move { Ok::<_, ()>(id) })
            .await
            .unwrap();
        assert!(supervisor.is_active(usage_id).await);

        sleep(Duration::from_secs(5)).await;
        let outcome = supervisor.cancel_and_join(usage_id).await.unwrap();
        assert_eq!(outcome.ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_everything() {
        let ledger = Arc::new(MemoryLedger::new());
        let supervisor = supervisor_with(ledger.clone());
        let members: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

        for member in &members {
            supervisor.spawn(Uuid::new_v4(), *member).await;
        }
        assert_eq!(supervisor.active_count().await, 4);

        sleep(Duration::from_secs(3)).await;
        supervisor.shutdown().await;
        assert_eq!(supervisor.active_count().await, 0);

        let after_shutdown: Vec<f64> = members.iter().map(|m| ledger.balance(*m)).collect();

        // spawning after shutdown is a no-op
        supervisor.spawn(Uuid::new_v4(), members[0]).await;
        assert_eq!(supervisor.active_count().await, 0);

        sleep(Duration::from_secs(120)).await;
        for (member, before) in members.iter().zip(after_shutdown) {
            assert_eq!(ledger.balance(*member), before);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_respawn_under_same_id_replaces_loop() {
        let ledger = Arc::new(MemoryLedger::new());
        let supervisor = supervisor_with(ledger.clone());
        let member = Uuid::new_v4();
        let usage_id = Uuid::new_v4();

        supervisor.spawn(usage_id, member).await;
        sleep(Duration::from_secs(1)).await;
        supervisor.spawn(usage_id, member).await;
        assert_eq!(supervisor.active_count().await, 1);

        sleep(Duration::from_secs(120)).await;

        // only the replacement ran to completion
        let expected = 30.0 * supervisor.policy().increment();
        assert!((ledger.balance(member) - expected).abs() < 1e-12);
        assert_eq!(supervisor.active_count().await, 0);
    }
}
