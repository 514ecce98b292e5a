//! Test support.
//!
//! Deterministic stand-ins for the clock and the sync endpoint, for tests of
//! this crate and of code built on it. Production code uses
//! [`SystemClock`](crate::SystemClock) and [`HttpRemote`](crate::HttpRemote).

pub use crate::clock::ManualClock;
pub use crate::sync::remote::MemoryRemote;
