//! Sync event types and status tracking

use std::fmt;

/// Status of the remote tier
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// No remote attached (unauthenticated session)
    #[default]
    Detached,
    /// Remote attached, nothing pending
    Idle,
    /// An edit is waiting for the quiet period to elapse
    Pending,
    /// Last fetch or push failed
    Error(String),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Detached => write!(f, "Detached"),
            SyncStatus::Idle => write!(f, "Idle"),
            SyncStatus::Pending => write!(f, "Pending"),
            SyncStatus::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Events emitted by the remote tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Remote set was non-empty and replaced the local one
    Adopted { count: usize },
    /// Remote set was empty and the local set was pushed as its seed
    Seeded { count: usize },
    /// A debounced push completed
    Pushed { count: usize },
    /// A fetch or push failed; local state is unchanged
    Failed { message: String },
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncEvent::Adopted { count } => write!(f, "Adopted {} remote entries", count),
            SyncEvent::Seeded { count } => write!(f, "Seeded remote with {} entries", count),
            SyncEvent::Pushed { count } => write!(f, "Pushed {} entries", count),
            SyncEvent::Failed { message } => write!(f, "Sync failed: {}", message),
        }
    }
}
