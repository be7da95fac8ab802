//! Content selection for spawn slots
//!
//! Resolution happens in two steps. First the slot's hint and the global
//! chances decide whether anything spawns and of which kind. Then a content id
//! of that kind is drawn uniformly from the catalog entries whose allowed zones
//! include the slot's lateral zone.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::slot::{ContentHint, SpawnSlot};
use crate::consts::{POSITION_THRESHOLD, PROBABILITY_EPSILON};

/// Lateral classification of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LateralZone {
    Left,
    Center,
    Right,
}

impl LateralZone {
    /// Classify a lateral offset against a symmetric threshold
    pub fn classify(offset: f32, threshold: f32) -> Self {
        if offset < -threshold {
            LateralZone::Left
        } else if offset > threshold {
            LateralZone::Right
        } else {
            LateralZone::Center
        }
    }
}

/// Lateral zones a content id may be placed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AllowedZones {
    #[default]
    All,
    LeftOnly,
    CenterOnly,
    RightOnly,
    LeftAndCenter,
    RightAndCenter,
    LeftAndRight,
}

impl AllowedZones {
    pub fn permits(self, zone: LateralZone) -> bool {
        use LateralZone::*;
        match self {
            AllowedZones::All => true,
            AllowedZones::LeftOnly => zone == Left,
            AllowedZones::CenterOnly => zone == Center,
            AllowedZones::RightOnly => zone == Right,
            AllowedZones::LeftAndCenter => zone != Right,
            AllowedZones::RightAndCenter => zone != Left,
            AllowedZones::LeftAndRight => zone != Center,
        }
    }
}

/// Identifier of an obstacle or pickup type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which catalog a spawned piece came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Obstacle,
    Pickup,
}

/// One catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ContentId,
    #[serde(default)]
    pub zones: AllowedZones,
}

/// Ordered content-id to allowed-zone mapping
///
/// A vector rather than a map so candidate order, and therefore the seeded
/// draw, is stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentCatalog {
    entries: Vec<CatalogEntry>,
}

impl ContentCatalog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry, replacing the zones of an existing id
    pub fn insert(&mut self, id: impl Into<String>, zones: AllowedZones) {
        let id = ContentId::new(id);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.zones = zones;
        } else {
            self.entries.push(CatalogEntry { id, zones });
        }
    }

    pub fn with(mut self, id: impl Into<String>, zones: AllowedZones) -> Self {
        self.insert(id, zones);
        self
    }

    pub fn zones_of(&self, id: &ContentId) -> Option<AllowedZones> {
        self.entries.iter().find(|e| &e.id == id).map(|e| e.zones)
    }

    /// Ids allowed in `zone`, in catalog order
    pub fn candidates(&self, zone: LateralZone) -> impl Iterator<Item = &ContentId> {
        self.entries
            .iter()
            .filter(move |e| e.zones.permits(zone))
            .map(|e| &e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Independent per-slot spawn chances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnChances {
    pub obstacle: f32,
    pub pickup: f32,
}

impl Default for SpawnChances {
    fn default() -> Self {
        Self {
            obstacle: 0.5,
            pickup: 0.3,
        }
    }
}

impl SpawnChances {
    pub fn new(obstacle: f32, pickup: f32) -> Self {
        Self { obstacle, pickup }
    }

    /// Chances clamped into [0, 1]
    pub fn clamped(self) -> Self {
        Self {
            obstacle: self.obstacle.clamp(0.0, 1.0),
            pickup: self.pickup.clamp(0.0, 1.0),
        }
    }
}

/// Outcome of resolving one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// The Bernoulli trial failed
    Nothing,
    /// A kind was rolled but no catalog entry fits the slot's zone
    NoCandidates { kind: ContentKind, zone: LateralZone },
    /// Place this content
    Content { kind: ContentKind, id: &'a ContentId },
}

/// Obstacle and pickup catalogs plus the chances and selector applied to them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnContent {
    pub obstacles: ContentCatalog,
    pub pickups: ContentCatalog,
    pub chances: SpawnChances,
    #[serde(default)]
    pub selector: ContentSelector,
}

impl SpawnContent {
    pub fn catalog(&self, kind: ContentKind) -> &ContentCatalog {
        match kind {
            ContentKind::Obstacle => &self.obstacles,
            ContentKind::Pickup => &self.pickups,
        }
    }

    /// Resolve a slot with this content's own selector
    pub fn select<R: Rng>(&self, slot: &SpawnSlot, rng: &mut R) -> Selection<'_> {
        self.selector.select(slot, self, rng)
    }
}

/// Picks content for spawn slots
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentSelector {
    pub position_threshold: f32,
}

impl Default for ContentSelector {
    fn default() -> Self {
        Self {
            position_threshold: POSITION_THRESHOLD,
        }
    }
}

impl ContentSelector {
    pub fn new(position_threshold: f32) -> Self {
        Self {
            position_threshold: position_threshold.abs(),
        }
    }

    pub fn zone_of(&self, slot: &SpawnSlot) -> LateralZone {
        LateralZone::classify(slot.lateral(), self.position_threshold)
    }

    /// Decide whether a slot with this hint spawns, and what kind
    pub fn resolve_kind<R: Rng>(
        &self,
        hint: ContentHint,
        chances: SpawnChances,
        rng: &mut R,
    ) -> Option<ContentKind> {
        let chances = chances.clamped();
        match hint {
            ContentHint::Obstacle => {
                (rng.random::<f32>() < chances.obstacle).then_some(ContentKind::Obstacle)
            }
            ContentHint::Pickup => {
                (rng.random::<f32>() < chances.pickup).then_some(ContentKind::Pickup)
            }
            ContentHint::Random => {
                let total = chances.obstacle + chances.pickup;
                if rng.random::<f32>() >= total {
                    return None;
                }
                let pickup_share = chances.pickup / total.max(PROBABILITY_EPSILON);
                if rng.random::<f32>() < pickup_share {
                    Some(ContentKind::Pickup)
                } else {
                    Some(ContentKind::Obstacle)
                }
            }
        }
    }

    /// Uniformly choose an id from `catalog` allowed in `zone`
    pub fn choose<'a, R: Rng>(
        &self,
        catalog: &'a ContentCatalog,
        zone: LateralZone,
        rng: &mut R,
    ) -> Option<&'a ContentId> {
        let candidates: Vec<&ContentId> = catalog.candidates(zone).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.random_range(0..candidates.len())])
    }

    /// Resolve one slot end to end
    pub fn select<'a, R: Rng>(
        &self,
        slot: &SpawnSlot,
        content: &'a SpawnContent,
        rng: &mut R,
    ) -> Selection<'a> {
        let Some(kind) = self.resolve_kind(slot.hint, content.chances, rng) else {
            return Selection::Nothing;
        };
        let zone = self.zone_of(slot);
        match self.choose(content.catalog(kind), zone, rng) {
            Some(id) => Selection::Content { kind, id },
            None => Selection::NoCandidates { kind, zone },
        }
    }
}
