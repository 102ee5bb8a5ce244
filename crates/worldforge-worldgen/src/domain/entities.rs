//! Generable entities and the trees the orchestrator assembles from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worldforge_generation::domain::payload::{
    NpcProfile, RegionDraft, SpotDraft, VehicleDescription, WorldDescription,
};

use super::status::{Generable, GenerationStatus, Lifecycle, RegionStatus};

macro_rules! generable {
    ($ty:ty, $status:ty, $entity:literal) => {
        impl Generable for $ty {
            type Status = $status;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> Uuid {
                self.id
            }

            fn lifecycle(&self) -> &Lifecycle<Self::Status> {
                &self.lifecycle
            }

            fn lifecycle_mut(&mut self) -> &mut Lifecycle<Self::Status> {
                &mut self.lifecycle
            }
        }
    };
}

/// A generated world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// World identifier.
    pub id: Uuid,
    /// The theme the world was generated from.
    pub theme: String,
    /// World name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Overall tone.
    pub tone: String,
    /// Cover image URL, once its call has settled successfully.
    pub cover_image_url: Option<String>,
    /// Status and timestamps.
    #[serde(flatten)]
    pub lifecycle: Lifecycle<GenerationStatus>,
}

impl World {
    /// Builds a world from its description, in `generating_text`.
    #[must_use]
    pub fn described(id: Uuid, theme: &str, description: WorldDescription, now: DateTime<Utc>) -> Self {
        Self {
            id,
            theme: theme.to_owned(),
            name: description.name,
            description: description.description,
            tone: description.tone,
            cover_image_url: None,
            lifecycle: Lifecycle::new(GenerationStatus::GeneratingText, now),
        }
    }
}

generable!(World, GenerationStatus, "world");

/// A region of a world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Region identifier.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Position in the world's region list.
    pub position: u32,
    /// Region name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Climate or biome.
    pub climate: String,
    /// Cover image URL.
    pub cover_image_url: Option<String>,
    /// Status and timestamps.
    #[serde(flatten)]
    pub lifecycle: Lifecycle<RegionStatus>,
}

impl Region {
    /// Builds a region from a list entry, in `generating_text`.
    #[must_use]
    pub fn described(world_id: Uuid, position: u32, draft: RegionDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            world_id,
            position,
            name: draft.name,
            description: draft.description,
            climate: draft.climate,
            cover_image_url: None,
            lifecycle: Lifecycle::new(RegionStatus::GeneratingText, now),
        }
    }
}

generable!(Region, RegionStatus, "region");

/// A visitable place inside a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    /// Spot identifier.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Owning region.
    pub region_id: Uuid,
    /// Stop number on the region's tour route.
    pub position: u32,
    /// Spot name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Kind of place.
    pub kind: String,
    /// Spot image URL.
    pub image_url: Option<String>,
    /// NPCs found here, in generation order.
    pub npc_ids: Vec<Uuid>,
    /// Status and timestamps.
    #[serde(flatten)]
    pub lifecycle: Lifecycle<GenerationStatus>,
}

impl Spot {
    /// Builds a spot from a list entry, in `generating_text`.
    #[must_use]
    pub fn described(
        world_id: Uuid,
        region_id: Uuid,
        position: u32,
        draft: SpotDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            world_id,
            region_id,
            position,
            name: draft.name,
            description: draft.description,
            kind: draft.kind,
            image_url: None,
            npc_ids: Vec::new(),
            lifecycle: Lifecycle::new(GenerationStatus::GeneratingText, now),
        }
    }
}

generable!(Spot, GenerationStatus, "spot");

/// A world-scoped character, optionally tied to a home spot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// NPC identifier.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Where the NPC is usually found.
    pub home_spot_id: Option<Uuid>,
    /// Name.
    pub name: String,
    /// Role at the spot.
    pub role: String,
    /// Personality sketch.
    pub personality: String,
    /// Physical appearance.
    pub appearance: String,
    /// Opening line.
    pub greeting: String,
    /// Portrait image URL.
    pub portrait_url: Option<String>,
    /// Dialog lines, in speaking order.
    pub dialog: Vec<String>,
    /// Status and timestamps.
    #[serde(flatten)]
    pub lifecycle: Lifecycle<GenerationStatus>,
}

impl Npc {
    /// Builds an NPC from its profile, in `generating_image`.
    #[must_use]
    pub fn profiled(
        world_id: Uuid,
        home_spot_id: Option<Uuid>,
        profile: NpcProfile,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            world_id,
            home_spot_id,
            name: profile.name,
            role: profile.role,
            personality: profile.personality,
            appearance: profile.appearance,
            greeting: profile.greeting,
            portrait_url: None,
            dialog: Vec::new(),
            lifecycle: Lifecycle::new(GenerationStatus::GeneratingImage, now),
        }
    }
}

generable!(Npc, GenerationStatus, "npc");

/// A means of travel between regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle identifier.
    pub id: Uuid,
    /// Owning world.
    pub world_id: Uuid,
    /// Name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Passenger capacity.
    pub capacity: u32,
    /// Image URL.
    pub image_url: Option<String>,
    /// Status and timestamps.
    #[serde(flatten)]
    pub lifecycle: Lifecycle<GenerationStatus>,
}

impl Vehicle {
    /// Builds a vehicle from its description, in `generating_image`.
    #[must_use]
    pub fn described(
        id: Uuid,
        world_id: Uuid,
        description: VehicleDescription,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            world_id,
            name: description.name,
            description: description.description,
            capacity: description.capacity,
            image_url: None,
            lifecycle: Lifecycle::new(GenerationStatus::GeneratingImage, now),
        }
    }
}

generable!(Vehicle, GenerationStatus, "vehicle");

/// A spot with its NPCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotTree {
    /// The spot.
    pub spot: Spot,
    /// Its NPCs, in the order of `spot.npc_ids`.
    pub npcs: Vec<Npc>,
}

/// A region with its spots, in tour order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTree {
    /// The region.
    pub region: Region,
    /// Its spots, ordered by position.
    pub spots: Vec<SpotTree>,
}

impl RegionTree {
    /// A region without spot detail.
    #[must_use]
    pub fn outlined(region: Region) -> Self {
        Self {
            region,
            spots: Vec::new(),
        }
    }

    /// Every NPC in the region, spot by spot.
    pub fn npcs(&self) -> impl Iterator<Item = &Npc> {
        self.spots.iter().flat_map(|spot| spot.npcs.iter())
    }
}

/// A world with everything generated under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTree {
    /// The world.
    pub world: World,
    /// Its regions, ordered by position.
    pub regions: Vec<RegionTree>,
    /// Its vehicles, in creation order.
    pub vehicles: Vec<Vehicle>,
}

impl WorldTree {
    /// Finds a region by ID.
    #[must_use]
    pub fn region(&self, region_id: Uuid) -> Option<&RegionTree> {
        self.regions.iter().find(|tree| tree.region.id == region_id)
    }

    /// Finds an NPC by ID anywhere in the world.
    #[must_use]
    pub fn npc(&self, npc_id: Uuid) -> Option<&Npc> {
        self.regions
            .iter()
            .flat_map(RegionTree::npcs)
            .find(|npc| npc.id == npc_id)
    }
}
