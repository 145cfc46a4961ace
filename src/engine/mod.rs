// src/engine/mod.rs

//! Resource-scoped execution.
//!
//! One run walks a fixed sequence of states:
//!
//! `NotStarted → ResourceAcquired → ChildRunning → ResourceReleased → Exited`
//!
//! Acquisition failures and interrupts skip the child but never skip
//! `ResourceReleased`. See [`scope::ScopedRun`].

pub mod scope;

pub use scope::ScopedRun;

/// Where a [`ScopedRun`] currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    NotStarted,
    ResourceAcquired,
    ChildRunning,
    ResourceReleased,
    Exited,
}
