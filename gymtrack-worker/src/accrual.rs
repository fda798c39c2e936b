/// Balance accrual loop
///
/// While a member has an open equipment session their balance grows by a
/// fixed amount every `interval`. The loop is bounded twice: by the session
/// (its cancellation token fires when the session ends) and by `max_ticks`,
/// so a session nobody ever closes still stops accruing.
///
/// # Timeline (defaults)
///
/// ```text
/// t=0s   session opened, loop starts
/// t=2s   tick 1: credit rate * 2 / 3600
/// t=4s   tick 2
/// ...
/// t=60s  tick 30, loop ends
/// ```
///
/// A cancellation that arrives while waiting for the next tick ends the loop
/// without crediting. A credit already in flight is not interrupted.
///
/// # Example
///
/// ```no_run
/// use gymtrack_worker::accrual::{run_accrual, AccrualPolicy};
/// use gymtrack_worker::ledger::MemoryLedger;
/// use tokio_util::sync::CancellationToken;
/// use uuid::Uuid;
///
/// # async fn example() {
/// let ledger = MemoryLedger::new();
/// let token = CancellationToken::new();
///
/// let outcome = run_accrual(
///     &ledger,
///     Uuid::new_v4(),
///     Uuid::new_v4(),
///     &AccrualPolicy::default(),
///     token,
/// )
/// .await;
/// assert_eq!(outcome.ticks, 30);
/// # }
/// ```

use crate::ledger::BalanceLedger;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Default accrual rate, currency units per hour of equipment use
pub const DEFAULT_RATE_PER_HOUR: f64 = 1.0;

/// Default delay between credits
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Default upper bound on credits per session
pub const DEFAULT_MAX_TICKS: u32 = 30;

/// How fast and for how long a session accrues
#[derive(Debug, Clone, PartialEq)]
pub struct AccrualPolicy {
    pub rate_per_hour: f64,
    pub interval: Duration,
    pub max_ticks: u32,
}

impl Default for AccrualPolicy {
    fn default() -> Self {
        Self {
            rate_per_hour: DEFAULT_RATE_PER_HOUR,
            interval: DEFAULT_INTERVAL,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl AccrualPolicy {
    /// Amount credited per tick
    pub fn increment(&self) -> f64 {
        self.rate_per_hour * self.interval.as_secs_f64() / 3600.0
    }

    /// Most a single session can ever credit
    pub fn max_total(&self) -> f64 {
        self.increment() * f64::from(self.max_ticks)
    }

    /// Longest a single loop can run
    pub fn max_duration(&self) -> Duration {
        self.interval * self.max_ticks
    }
}

/// Summary of one finished accrual loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccrualOutcome {
    /// Credits that succeeded
    pub ticks: u32,

    /// Credits that failed and were skipped
    pub failed_ticks: u32,

    /// Sum of successful credits
    pub credited: f64,

    /// Whether the loop ended because its token fired
    pub cancelled: bool,
}

/// Runs the accrual loop for one session until cancelled or out of ticks
///
/// A failed credit is logged and counted; the loop keeps going.
pub async fn run_accrual(
    ledger: &dyn BalanceLedger,
    user_id: Uuid,
    usage_id: Uuid,
    policy: &AccrualPolicy,
    cancel_token: CancellationToken,
) -> AccrualOutcome {
    let increment = policy.increment();
    let mut outcome = AccrualOutcome::default();

    tracing::debug!(
        user_id = %user_id,
        usage_id = %usage_id,
        increment,
        max_ticks = policy.max_ticks,
        "Accrual started"
    );

    for tick in 1..=policy.max_ticks {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                outcome.cancelled = true;
                break;
            }
            _ = sleep(policy.interval) => {}
        }

        match ledger.credit(user_id, increment).await {
            Ok(balance) => {
                outcome.ticks += 1;
                outcome.credited += increment;
                tracing::trace!(usage_id = %usage_id, tick, balance, "Balance credited");
            }
            Err(e) => {
                outcome.failed_ticks += 1;
                tracing::warn!(
                    user_id = %user_id,
                    usage_id = %usage_id,
                    tick,
                    error = %e,
                    "Balance credit failed"
                );
            }
        }
    }

    tracing::debug!(
        usage_id = %usage_id,
        ticks = outcome.ticks,
        failed_ticks = outcome.failed_ticks,
        credited = outcome.credited,
        cancelled = outcome.cancelled,
        "Accrual finished"
    );

    outcome
}
