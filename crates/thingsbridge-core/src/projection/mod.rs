// ── Entity projections ──
//
// Host-visible points over individual Snapshot keys, the per-entry
// registry that tracks them, and the platform glue that discovers new
// keys on every refresh.

pub mod platform;
pub mod point;
pub mod registry;

pub use platform::{EntitySink, discover, setup_platform};
pub use point::{
    DOMAIN, DeviceInfo, NumberLimits, PointKind, PointState, Projection, ReadOnlyPoint,
    ReadWritePoint, StateClass,
};
pub use registry::ProjectionRegistry;
