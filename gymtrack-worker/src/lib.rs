//! # GymTrack Worker Library
//!
//! Background balance accrual for open equipment sessions.
//!
//! ## Modules
//!
//! - `accrual`: The bounded, cancellable accrual loop and its policy
//! - `ledger`: The `BalanceLedger` seam (PostgreSQL and in-memory)
//! - `supervisor`: Registry of running loops keyed by usage record
//!
//! ## Example
//!
//! ```no_run
//! use gymtrack_worker::{accrual::AccrualPolicy, ledger::MemoryLedger, supervisor::AccrualSupervisor};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn example() {
//! let supervisor = AccrualSupervisor::new(Arc::new(MemoryLedger::new()), AccrualPolicy::default());
//! supervisor.spawn(Uuid::new_v4(), Uuid::new_v4()).await;
//! supervisor.shutdown().await;
//! # }
//! ```

pub mod accrual;
pub mod ledger;
pub mod supervisor;
