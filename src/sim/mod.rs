//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-driven timestep only
//! - Seeded RNG only
//! - Stable iteration order (catalog order, slot order, segment queue order)
//! - No rendering or platform dependencies

pub mod factory;
pub mod player;
pub mod segment;
pub mod selector;
pub mod slot;
pub mod speed;
pub mod state;
pub mod streamer;
pub mod tick;

pub use factory::{ContentFactory, InstanceId, InstanceRegistry, LiveInstance, Placement};
pub use player::{ControlScheme, Player, lean_to_lateral};
pub use segment::{
    Populate, PopulateReport, SegmentId, SegmentTemplate, SpawnedContent, TrackSegment,
    compensate_scale,
};
pub use selector::{
    AllowedZones, CatalogEntry, ContentCatalog, ContentId, ContentKind, ContentSelector,
    LateralZone, Selection, SpawnChances, SpawnContent,
};
pub use slot::{ContentHint, SpawnPointRegistry, SpawnSlot};
pub use speed::{SpeedController, SpeedCurve};
pub use state::{RunPhase, RunState};
pub use streamer::{PoolingStrategy, TickReport, TrackStreamer};
pub use tick::{TickInput, tick};
