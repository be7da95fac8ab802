//! Track segments and their spawned content
//!
//! A segment is one recyclable tile of track. It owns its spawn slots for its
//! whole life and records every instance it spawns so `clear` can destroy them.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::factory::{ContentFactory, InstanceId, Placement};
use super::selector::{ContentId, ContentKind, Selection, SpawnContent};
use super::slot::SpawnPointRegistry;
use crate::consts::SCALE_EPSILON;

/// Stable identity of a pooled segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// Blueprint every segment is built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTemplate {
    pub slots: SpawnPointRegistry,
    /// World scale of the segment, which spawned content must cancel out
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl SegmentTemplate {
    pub fn new(slots: SpawnPointRegistry) -> Self {
        Self {
            slots,
            scale: Vec3::ONE,
        }
    }

    /// Default three-lane layout
    pub fn lanes(track_length: f32, lane_width: f32) -> Self {
        Self::new(SpawnPointRegistry::lanes(track_length, lane_width))
    }
}

/// Record of one spawned instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnedContent {
    pub instance: InstanceId,
    pub content: ContentId,
    pub kind: ContentKind,
    /// Index of the slot it occupies
    pub slot: usize,
}

/// Summary of a single populate pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub spawned: usize,
    /// Slots whose trial rolled nothing
    pub empty_rolls: usize,
    /// Slots whose zone filter left no candidates
    pub zone_gaps: usize,
}

/// Something that can fill itself with content and later empty itself
pub trait Populate {
    fn populate<F: ContentFactory, R: Rng>(
        &mut self,
        content: &SpawnContent,
        factory: &mut F,
        rng: &mut R,
    ) -> PopulateReport;

    fn clear<F: ContentFactory>(&mut self, factory: &mut F);
}

/// Local scale that makes content keep its authored size under `parent`
///
/// Parent components near zero are treated as 1.
pub fn compensate_scale(authored: Vec3, parent: Vec3) -> Vec3 {
    let near_zero = parent.abs().cmplt(Vec3::splat(SCALE_EPSILON));
    authored / Vec3::select(near_zero, Vec3::ONE, parent)
}

/// One tile of track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSegment {
    pub id: SegmentId,
    /// Forward position of the segment origin
    pub z: f32,
    pub scale: Vec3,
    slots: SpawnPointRegistry,
    spawned: Vec<SpawnedContent>,
}

impl TrackSegment {
    pub fn new(id: SegmentId, template: &SegmentTemplate) -> Self {
        Self {
            id,
            z: 0.0,
            scale: template.scale,
            slots: template.slots.clone(),
            spawned: Vec::new(),
        }
    }

    /// Translate along the forward axis
    #[inline]
    pub fn advance(&mut self, dz: f32) {
        self.z += dz;
    }

    /// Forward coordinate of the far end of this segment
    #[inline]
    pub fn forward_edge(&self, track_length: f32) -> f32 {
        self.z + track_length
    }

    /// World position of a segment-local point
    pub fn world_position(&self, local: Vec3) -> Vec3 {
        Vec3::new(0.0, 0.0, self.z) + local * self.scale
    }

    pub fn slots(&self) -> &SpawnPointRegistry {
        &self.slots
    }

    pub fn spawned(&self) -> &[SpawnedContent] {
        &self.spawned
    }

    pub fn is_populated(&self) -> bool {
        !self.spawned.is_empty()
    }

    pub fn count(&self, kind: ContentKind) -> usize {
        self.spawned.iter().filter(|s| s.kind == kind).count()
    }
}

impl Populate for TrackSegment {
    fn populate<F: ContentFactory, R: Rng>(
        &mut self,
        content: &SpawnContent,
        factory: &mut F,
        rng: &mut R,
    ) -> PopulateReport {
        self.clear(factory);

        let mut report = PopulateReport::default();
        if self.slots.is_empty() {
            log::warn!("Segment {:?} has no spawn slots; left empty", self.id);
            return report;
        }

        for (index, slot) in self.slots.iter().enumerate() {
            match content.select(slot, rng) {
                Selection::Nothing => report.empty_rolls += 1,
                Selection::NoCandidates { kind, zone } => {
                    log::debug!(
                        "Segment {:?} slot '{}': no {:?} content allowed in {:?}",
                        self.id,
                        slot.name,
                        kind,
                        zone
                    );
                    report.zone_gaps += 1;
                }
                Selection::Content { kind, id } => {
                    let placement = Placement {
                        position: slot.offset,
                        rotation: slot.rotation,
                        scale: compensate_scale(factory.authored_scale(id), self.scale),
                    };
                    let instance = factory.spawn(self.id, id, placement);
                    self.spawned.push(SpawnedContent {
                        instance,
                        content: id.clone(),
                        kind,
                        slot: index,
                    });
                    report.spawned += 1;
                }
            }
        }

        report
    }

    fn clear<F: ContentFactory>(&mut self, factory: &mut F) {
        for spawned in self.spawned.drain(..) {
            factory.despawn(spawned.instance);
        }
    }
}
