// ── Entry configuration ──
//
// Everything a coordinator needs for one configured device endpoint.
// Host-side persistence lives in `thingsbridge-config`; this is the
// resolved, in-memory form.

use std::time::Duration;

use secrecy::SecretString;

/// Default poll period.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Deadline for a scheduled or on-demand refresh.
pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for attribute writes.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Deadline for the one-shot setup validation probe.
pub const VALIDATE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved configuration for one entry.
#[derive(Debug, Clone)]
pub struct EntryConfig {
    /// Stable entry id (a UUID assigned when the entry was created).
    pub entry_id: String,
    /// Display title, e.g. `ThingsBoard (https://tb.example.com)`.
    pub title: String,
    /// Normalized host, scheme included, no trailing slash.
    pub host: String,
    pub access_token: SecretString,
    /// Poll period. `Duration::ZERO` disables periodic refresh.
    pub scan_interval: Duration,
    pub refresh_timeout: Duration,
    pub write_timeout: Duration,
}

impl EntryConfig {
    /// Config with the default interval and timeouts.
    pub fn new(
        entry_id: impl Into<String>,
        title: impl Into<String>,
        host: impl Into<String>,
        access_token: SecretString,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            title: title.into(),
            host: host.into(),
            access_token,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            refresh_timeout: REFRESH_TIMEOUT,
            write_timeout: WRITE_TIMEOUT,
        }
    }

    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }
}
