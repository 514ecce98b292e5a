//! Runtime configuration shared by the binaries.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// How often the virtual clock ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Quiet window before an edit is pushed to the remote
pub const DEFAULT_SYNC_QUIET_PERIOD: Duration = Duration::from_secs(1);

/// Where and how to reach the sync endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Server base URL, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Bearer token identifying the user
    pub token: String,
}

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
    pub sync_quiet_period: Duration,
    /// Overrides the detected zone of the home entry
    pub home_timezone: Option<String>,
    /// `None` for an unauthenticated, local-only session
    pub remote: Option<RemoteConfig>,
}

impl ClockConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            sync_quiet_period: DEFAULT_SYNC_QUIET_PERIOD,
            home_timezone: None,
            remote: None,
        }
    }

    pub fn with_remote(mut self, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        self.remote = Some(RemoteConfig {
            base_url: base_url.into(),
            token: token.into(),
        });
        self
    }

    pub fn with_sync_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.sync_quiet_period = quiet_period;
        self
    }

    pub fn with_home_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.home_timezone = Some(timezone.into());
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::new(default_data_dir())
    }
}

/// Default data directory (~/.worldclock/data)
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".worldclock")
        .join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClockConfig::new("/tmp/wc");
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.sync_quiet_period, Duration::from_secs(1));
        assert!(config.remote.is_none());
        assert_eq!(config.data_dir(), Path::new("/tmp/wc"));
    }

    #[test]
    fn test_with_remote() {
        let config = ClockConfig::new("/tmp/wc").with_remote("http://localhost:8080", "secret");
        let remote = config.remote.unwrap();
        assert_eq!(remote.base_url, "http://localhost:8080");
        assert_eq!(remote.token, "secret");
    }

    #[test]
    fn test_default_data_dir_layout() {
        assert!(default_data_dir().ends_with(".worldclock/data"));
    }
}
