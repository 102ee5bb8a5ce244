//! Persistence port for generated entities.

use async_trait::async_trait;
use uuid::Uuid;
use worldforge_core::error::DomainError;

use super::entities::{Npc, Region, Spot, Vehicle, World, WorldTree};

/// Upserts whole entities and reads back assembled world trees.
///
/// Writes are last-writer-wins. Implementations must be safe to call from
/// concurrent branches of one job.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Upserts a world.
    async fn save_world(&self, world: &World) -> Result<(), DomainError>;

    /// Upserts a region.
    async fn save_region(&self, region: &Region) -> Result<(), DomainError>;

    /// Upserts a spot.
    async fn save_spot(&self, spot: &Spot) -> Result<(), DomainError>;

    /// Upserts an NPC.
    async fn save_npc(&self, npc: &Npc) -> Result<(), DomainError>;

    /// Upserts a vehicle.
    async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<(), DomainError>;

    /// Loads a world with its regions, spots, NPCs, and vehicles.
    async fn get_world(&self, world_id: Uuid) -> Result<Option<WorldTree>, DomainError>;
}
