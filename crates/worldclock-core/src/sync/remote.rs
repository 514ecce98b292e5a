//! Client side of the sync endpoint.
//!
//! The endpoint is an opaque per-user store: `GET` returns the user's records,
//! `POST` replaces them wholesale.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

use crate::error::{ClockError, ClockResult};
use crate::types::{RemoteTimezone, TimezoneEntry};

/// Path of the sync endpoint relative to the server base URL
pub const SYNC_PATH: &str = "/api/sync/timezones";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned by a successful push
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    pub success: bool,
}

/// Remote store of the user's timezone set
#[async_trait]
pub trait RemoteSync: Send + Sync {
    /// Fetch the user's set in insertion order
    async fn fetch(&self) -> ClockResult<Vec<RemoteTimezone>>;

    /// Replace the user's set with `entries`
    async fn push(&self, entries: &[TimezoneEntry]) -> ClockResult<()>;
}

/// Sync endpoint reached over HTTP with a bearer token
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpRemote {
    pub fn new(base_url: &str, token: impl Into<String>) -> ClockResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SYNC_PATH),
            token: token.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteSync for HttpRemote {
    async fn fetch(&self) -> ClockResult<Vec<RemoteTimezone>> {
        let records: Vec<RemoteTimezone> = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(endpoint = %self.endpoint, count = records.len(), "Fetched remote timezones");
        Ok(records)
    }

    async fn push(&self, entries: &[TimezoneEntry]) -> ClockResult<()> {
        let response: PushResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(entries)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !response.success {
            return Err(ClockError::Network("server rejected push".to_string()));
        }

        debug!(endpoint = %self.endpoint, count = entries.len(), "Pushed timezones");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryRemoteState {
    records: Vec<RemoteTimezone>,
    fetch_calls: usize,
    pushes: Vec<Vec<TimezoneEntry>>,
    failing: bool,
}

/// In-process sync endpoint (test support, see [`crate::testing`])
///
/// Keeps every pushed snapshot so callers can inspect what was sent. Clones
/// share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryRemoteState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote that already holds `entries`
    pub fn with_entries(entries: &[TimezoneEntry]) -> Self {
        let remote = Self::new();
        remote.state.lock().records = to_records(entries);
        remote
    }

    /// Make every subsequent call fail with a network error
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().fetch_calls
    }

    pub fn push_count(&self) -> usize {
        self.state.lock().pushes.len()
    }

    /// Every snapshot received, oldest first
    pub fn pushes(&self) -> Vec<Vec<TimezoneEntry>> {
        self.state.lock().pushes.clone()
    }

    pub fn records(&self) -> Vec<RemoteTimezone> {
        self.state.lock().records.clone()
    }
}

fn to_records(entries: &[TimezoneEntry]) -> Vec<RemoteTimezone> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| RemoteTimezone {
            id: Ulid::new(),
            entry_id: Some(e.id.clone()),
            city: e.city.clone(),
            country: e.country.clone(),
            timezone: e.timezone.clone(),
            created_at: i as i64,
        })
        .collect()
}

#[async_trait]
impl RemoteSync for MemoryRemote {
    async fn fetch(&self) -> ClockResult<Vec<RemoteTimezone>> {
        let mut state = self.state.lock();
        state.fetch_calls += 1;
        if state.failing {
            return Err(ClockError::Network("remote unavailable".to_string()));
        }
        Ok(state.records.clone())
    }

    async fn push(&self, entries: &[TimezoneEntry]) -> ClockResult<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(ClockError::Network("remote unavailable".to_string()));
        }
        state.pushes.push(entries.to_vec());
        state.records = to_records(entries);
        Ok(())
    }
}
