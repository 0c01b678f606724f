// thingsbridge-api: Async Rust client for the ThingsBoard device attributes API

pub mod client;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use client::{AttributesClient, AttributesResponse};
pub use endpoint::Endpoint;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

/// Client-wide request ceiling when none is configured.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Re-exported so callers can match on probe results without a direct
/// `reqwest` dependency.
pub use reqwest::StatusCode;
