//! Remote tier of the persistence protocol.
//!
//! - [`RemoteSync`]: the sync endpoint as seen by the client ([`HttpRemote`];
//!   `MemoryRemote` for tests)
//! - [`Debouncer`]: coalesces rapid local edits into one push after a quiet
//!   period
//! - [`SyncEvent`]: notifications about fetches and pushes

pub mod debounce;
pub mod events;
pub mod remote;

pub use debounce::Debouncer;
pub use events::{SyncEvent, SyncStatus};
pub use remote::{HttpRemote, PushResponse, RemoteSync, SYNC_PATH};
