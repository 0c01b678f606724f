//! Polling core between `thingsbridge-api` and a host application.
//!
//! - **[`Coordinator`]**: owns one device's latest [`Snapshot`], refreshes
//!   it on an interval or on demand, writes attributes back with
//!   [`write()`](Coordinator::write) followed by a resync, and notifies
//!   observers after every refresh attempt.
//!
//! - **[`flatten()`]**: turns the nested `{client, shared}` response into
//!   namespace-qualified [`AttributeKey`]s.
//!
//! - **Projections** ([`projection`]): read-only and read-write points
//!   over single keys, discovered dynamically into a per-entry
//!   [`ProjectionRegistry`] and handed to an [`EntitySink`].
//!
//! - **[`Bridge`]**: per-entry set-up/unload/reload and routing of the
//!   attribute-write [`Command`]s.
//!
//! - **[`setup`]**: one-shot host/token validation used when an entry is
//!   created.

pub mod command;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod flatten;
pub mod model;
pub mod projection;
pub mod runtime;
pub mod setup;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::Command;
pub use config::{
    DEFAULT_SCAN_INTERVAL, EntryConfig, REFRESH_TIMEOUT, VALIDATE_TIMEOUT, WRITE_TIMEOUT,
};
pub use coordinator::{Coordinator, CoordinatorState, FailureKind, RefreshEvent, Subscription};
pub use error::CoreError;
pub use flatten::flatten;
pub use model::{AttributeKey, AttributeMap, AttributeValue, Namespace, Snapshot};
pub use projection::{
    DeviceInfo, EntitySink, NumberLimits, PointKind, PointState, Projection, ProjectionRegistry,
    ReadOnlyPoint, ReadWritePoint, StateClass,
};
pub use runtime::Bridge;
pub use setup::{SetupError, ValidatedInput, validate_input};
