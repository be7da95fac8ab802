//! Content instantiation seam
//!
//! The engine owns actual objects. The simulation only asks a factory to
//! create content under a segment and later destroy it by handle.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::segment::SegmentId;
use super::selector::ContentId;

/// Handle to a spawned content instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

/// Segment-local transform for a new instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// Creates and destroys content instances
pub trait ContentFactory {
    /// Instantiate `content` parented to `segment`
    fn spawn(&mut self, segment: SegmentId, content: &ContentId, placement: Placement)
    -> InstanceId;

    /// Destroy a previously spawned instance
    fn despawn(&mut self, instance: InstanceId);

    /// Local scale the content was authored with
    fn authored_scale(&self, _content: &ContentId) -> Vec3 {
        Vec3::ONE
    }
}

/// A live instance tracked by [`InstanceRegistry`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveInstance {
    pub segment: SegmentId,
    pub content: ContentId,
    pub placement: Placement,
}

/// In-memory factory used by the headless driver and tests
#[derive(Debug, Clone, Default)]
pub struct InstanceRegistry {
    live: HashMap<InstanceId, LiveInstance>,
    authored_scales: HashMap<ContentId, Vec3>,
    next_id: u64,
    /// Total spawns since creation
    pub spawned_total: u64,
    /// Total despawns since creation
    pub despawned_total: u64,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the authored scale reported for a content id
    pub fn set_authored_scale(&mut self, content: ContentId, scale: Vec3) {
        self.authored_scales.insert(content, scale);
    }

    pub fn get(&self, instance: InstanceId) -> Option<&LiveInstance> {
        self.live.get(&instance)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Instances parented to `segment`, sorted by handle
    pub fn instances_of(&self, segment: SegmentId) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self
            .live
            .iter()
            .filter(|(_, inst)| inst.segment == segment)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }
}

impl ContentFactory for InstanceRegistry {
    fn spawn(
        &mut self,
        segment: SegmentId,
        content: &ContentId,
        placement: Placement,
    ) -> InstanceId {
        self.next_id += 1;
        let id = InstanceId(self.next_id);
        self.live.insert(
            id,
            LiveInstance {
                segment,
                content: content.clone(),
                placement,
            },
        );
        self.spawned_total += 1;
        id
    }

    fn despawn(&mut self, instance: InstanceId) {
        if self.live.remove(&instance).is_some() {
            self.despawned_total += 1;
        } else {
            log::warn!("Despawn of unknown instance {:?}", instance);
        }
    }

    fn authored_scale(&self, content: &ContentId) -> Vec3 {
        self.authored_scales
            .get(content)
            .copied()
            .unwrap_or(Vec3::ONE)
    }
}
