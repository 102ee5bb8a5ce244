//! In-memory implementation of the `EntityRepository` and
//! `CallRecordRepository` traits.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;
use worldforge_core::error::DomainError;
use worldforge_generation::domain::ports::CallRecordRepository;
use worldforge_generation::domain::record::CallAttemptRecord;
use worldforge_worldgen::domain::entities::{
    Npc, Region, RegionTree, Spot, SpotTree, Vehicle, World, WorldTree,
};
use worldforge_worldgen::domain::ports::EntityRepository;

#[derive(Debug, Default)]
struct Tables {
    worlds: HashMap<Uuid, World>,
    regions: HashMap<Uuid, Region>,
    spots: HashMap<Uuid, Spot>,
    npcs: HashMap<Uuid, Npc>,
    vehicles: HashMap<Uuid, Vehicle>,
}

impl Tables {
    fn assemble(&self, world_id: Uuid) -> Option<WorldTree> {
        let world = self.worlds.get(&world_id)?.clone();

        let mut regions: Vec<&Region> = self
            .regions
            .values()
            .filter(|region| region.world_id == world_id)
            .collect();
        regions.sort_by_key(|region| region.position);

        let regions = regions
            .into_iter()
            .map(|region| {
                let mut spots: Vec<&Spot> = self
                    .spots
                    .values()
                    .filter(|spot| spot.region_id == region.id)
                    .collect();
                spots.sort_by_key(|spot| spot.position);
                RegionTree {
                    region: region.clone(),
                    spots: spots
                        .into_iter()
                        .map(|spot| SpotTree {
                            spot: spot.clone(),
                            npcs: spot
                                .npc_ids
                                .iter()
                                .filter_map(|id| self.npcs.get(id).cloned())
                                .collect(),
                        })
                        .collect(),
                }
            })
            .collect();

        let mut vehicles: Vec<Vehicle> = self
            .vehicles
            .values()
            .filter(|vehicle| vehicle.world_id == world_id)
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| {
            a.lifecycle
                .created_at
                .cmp(&b.lifecycle.created_at)
                .then(a.id.cmp(&b.id))
        });

        Some(WorldTree {
            world,
            regions,
            vehicles,
        })
    }
}

/// Process-local store for entities and call records.
///
/// Entity writes are whole-entity upserts; the last write wins.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    call_records: RwLock<Vec<CallAttemptRecord>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call record, in save order.
    pub async fn call_records(&self) -> Vec<CallAttemptRecord> {
        self.call_records.read().await.clone()
    }

    /// Call records correlated with `world_id`, in save order.
    pub async fn call_records_for_world(&self, world_id: Uuid) -> Vec<CallAttemptRecord> {
        self.call_records
            .read()
            .await
            .iter()
            .filter(|record| record.correlation.world_id == Some(world_id))
            .cloned()
            .collect()
    }

    /// Looks up a single NPC.
    pub async fn npc(&self, npc_id: Uuid) -> Option<Npc> {
        self.tables.read().await.npcs.get(&npc_id).cloned()
    }
}

#[async_trait]
impl EntityRepository for InMemoryStore {
    async fn save_world(&self, world: &World) -> Result<(), DomainError> {
        debug!(world_id = %world.id, "saving world");
        self.tables
            .write()
            .await
            .worlds
            .insert(world.id, world.clone());
        Ok(())
    }

    async fn save_region(&self, region: &Region) -> Result<(), DomainError> {
        debug!(region_id = %region.id, "saving region");
        self.tables
            .write()
            .await
            .regions
            .insert(region.id, region.clone());
        Ok(())
    }

    async fn save_spot(&self, spot: &Spot) -> Result<(), DomainError> {
        debug!(spot_id = %spot.id, "saving spot");
        self.tables.write().await.spots.insert(spot.id, spot.clone());
        Ok(())
    }

    async fn save_npc(&self, npc: &Npc) -> Result<(), DomainError> {
        debug!(npc_id = %npc.id, "saving npc");
        self.tables.write().await.npcs.insert(npc.id, npc.clone());
        Ok(())
    }

    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<(), DomainError> {
        debug!(vehicle_id = %vehicle.id, "saving vehicle");
        self.tables
            .write()
            .await
            .vehicles
            .insert(vehicle.id, vehicle.clone());
        Ok(())
    }

    async fn get_world(&self, world_id: Uuid) -> Result<Option<WorldTree>, DomainError> {
        Ok(self.tables.read().await.assemble(world_id))
    }
}

#[async_trait]
impl CallRecordRepository for InMemoryStore {
    async fn save_call_record(&self, record: &CallAttemptRecord) -> Result<(), DomainError> {
        self.call_records.write().await.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use worldforge_generation::domain::call::{CallCorrelation, CallKind};
    use worldforge_generation::domain::payload::{
        NpcProfile, RegionDraft, SpotDraft, VehicleDescription, WorldDescription,
    };
    use worldforge_worldgen::domain::status::{Generable, GenerationStatus};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn world() -> World {
        World::described(
            Uuid::new_v4(),
            "ash",
            WorldDescription {
                name: "Cinder".to_owned(),
                description: "Everything smoulders.".to_owned(),
                tone: String::new(),
            },
            now(),
        )
    }

    fn region(world_id: Uuid, position: u32, name: &str) -> Region {
        Region::described(
            world_id,
            position,
            RegionDraft {
                name: name.to_owned(),
                description: "Grey dunes.".to_owned(),
                climate: "dry".to_owned(),
            },
            now(),
        )
    }

    fn spot(world_id: Uuid, region_id: Uuid, position: u32, name: &str) -> Spot {
        Spot::described(
            world_id,
            region_id,
            position,
            SpotDraft {
                name: name.to_owned(),
                description: "A stop.".to_owned(),
                kind: "ruin".to_owned(),
            },
            now(),
        )
    }

    fn npc(world_id: Uuid, spot_id: Uuid, name: &str) -> Npc {
        Npc::profiled(
            world_id,
            Some(spot_id),
            NpcProfile {
                name: name.to_owned(),
                role: "guide".to_owned(),
                personality: String::new(),
                appearance: String::new(),
                greeting: String::new(),
            },
            now(),
        )
    }

    #[tokio::test]
    async fn test_get_world_returns_none_for_unknown_id() {
        let store = InMemoryStore::new();

        let result = store.get_world(Uuid::new_v4()).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_world_orders_regions_spots_and_npcs() {
        // Arrange
        let store = InMemoryStore::new();
        let world = world();
        let second = region(world.id, 1, "Second");
        let first = region(world.id, 0, "First");
        let late = spot(world.id, first.id, 1, "Late");
        let mut early = spot(world.id, first.id, 0, "Early");
        let b = npc(world.id, early.id, "B");
        let a = npc(world.id, early.id, "A");
        early.npc_ids = vec![b.id, a.id];
        store.save_world(&world).await.unwrap();
        for r in [&second, &first] {
            store.save_region(r).await.unwrap();
        }
        for s in [&late, &early] {
            store.save_spot(s).await.unwrap();
        }
        for n in [&a, &b] {
            store.save_npc(n).await.unwrap();
        }

        // Act
        let tree = store.get_world(world.id).await.unwrap().unwrap();

        // Assert
        let names: Vec<&str> = tree.regions.iter().map(|r| r.region.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        let spots: Vec<&str> = tree.regions[0]
            .spots
            .iter()
            .map(|s| s.spot.name.as_str())
            .collect();
        assert_eq!(spots, vec!["Early", "Late"]);
        let npcs: Vec<&str> = tree.regions[0].spots[0]
            .npcs
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(npcs, vec!["B", "A"]);
        assert!(tree.regions[1].spots.is_empty());
    }

    #[tokio::test]
    async fn test_save_is_last_writer_wins() {
        // Arrange
        let store = InMemoryStore::new();
        let mut world = world();
        store.save_world(&world).await.unwrap();
        world.advance(GenerationStatus::Ready, now());

        // Act
        store.save_world(&world).await.unwrap();

        // Assert
        let tree = store.get_world(world.id).await.unwrap().unwrap();
        assert_eq!(tree.world.status(), GenerationStatus::Ready);
    }

    #[tokio::test]
    async fn test_vehicles_are_scoped_to_their_world() {
        // Arrange
        let store = InMemoryStore::new();
        let world = world();
        let other = self::world();
        store.save_world(&world).await.unwrap();
        let vehicle = Vehicle::described(
            Uuid::new_v4(),
            world.id,
            VehicleDescription {
                name: "Ash Sled".to_owned(),
                description: "Runs on cinders.".to_owned(),
                capacity: 4,
            },
            now(),
        );
        let stray = Vehicle::described(
            Uuid::new_v4(),
            other.id,
            VehicleDescription {
                name: "Stray".to_owned(),
                description: "Elsewhere.".to_owned(),
                capacity: 1,
            },
            now(),
        );
        store.save_vehicle(&vehicle).await.unwrap();
        store.save_vehicle(&stray).await.unwrap();

        // Act
        let tree = store.get_world(world.id).await.unwrap().unwrap();

        // Assert
        assert_eq!(tree.vehicles.len(), 1);
        assert_eq!(tree.vehicles[0].name, "Ash Sled");
    }

    #[tokio::test]
    async fn test_call_records_filter_by_world() {
        // Arrange
        let store = InMemoryStore::new();
        let world_id = Uuid::new_v4();
        let record = |world: Option<Uuid>| CallAttemptRecord {
            id: Uuid::new_v4(),
            kind: CallKind::Image,
            correlation: CallCorrelation {
                world_id: world,
                ..CallCorrelation::default()
            },
            prompt: "p".to_owned(),
            success: true,
            response: None,
            error: None,
            model: None,
            usage: None,
            duration_ms: 1,
            retry_count: 0,
            recorded_at: now(),
        };
        store.save_call_record(&record(Some(world_id))).await.unwrap();
        store.save_call_record(&record(None)).await.unwrap();

        // Act
        let scoped = store.call_records_for_world(world_id).await;

        // Assert
        assert_eq!(scoped.len(), 1);
        assert_eq!(store.call_records().await.len(), 2);
    }
}
