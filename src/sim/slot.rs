//! Spawn points on a track segment
//!
//! Each segment owns a fixed set of named slots. A slot's local position is
//! relative to the segment origin: x is lateral, y is up, z is forward.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// What kind of content a slot may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentHint {
    /// Obstacles only
    Obstacle,
    /// Pickups only
    Pickup,
    /// Either, apportioned by the obstacle/pickup chances
    Random,
}

/// A fixed content-placement location on a segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnSlot {
    pub name: String,
    /// Segment-local position
    pub offset: Vec3,
    /// Segment-local orientation
    #[serde(default)]
    pub rotation: Quat,
    pub hint: ContentHint,
}

impl SpawnSlot {
    pub fn new(name: impl Into<String>, offset: Vec3, hint: ContentHint) -> Self {
        Self {
            name: name.into(),
            offset,
            rotation: Quat::IDENTITY,
            hint,
        }
    }

    /// Signed sideways offset used for zone classification
    #[inline]
    pub fn lateral(&self) -> f32 {
        self.offset.x
    }
}

/// Ordered set of spawn slots belonging to one segment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnPointRegistry {
    slots: Vec<SpawnSlot>,
}

impl SpawnPointRegistry {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn with_slots(slots: Vec<SpawnSlot>) -> Self {
        Self { slots }
    }

    /// Three lanes by three rows: obstacles up front, either in the middle,
    /// pickups at the back.
    pub fn lanes(track_length: f32, lane_width: f32) -> Self {
        let rows = [
            ("front", 0.25, ContentHint::Obstacle),
            ("mid", 0.5, ContentHint::Random),
            ("back", 0.75, ContentHint::Pickup),
        ];
        let lanes = [("left", -lane_width), ("center", 0.0), ("right", lane_width)];

        let mut registry = Self::new();
        for (row, fraction, hint) in rows {
            for (lane, x) in lanes {
                registry.add(SpawnSlot::new(
                    format!("{row}_{lane}"),
                    Vec3::new(x, 0.0, track_length * fraction),
                    hint,
                ));
            }
        }
        registry
    }

    pub fn add(&mut self, slot: SpawnSlot) {
        self.slots.push(slot);
    }

    pub fn get(&self, name: &str) -> Option<&SpawnSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpawnSlot> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
