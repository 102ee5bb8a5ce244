//! Commands accepted by the World Generation context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use worldforge_core::error::DomainError;

/// Largest region or spot count a single request may ask for.
pub const MAX_LIST_COUNT: u32 = 12;

/// Largest number of NPCs generated per spot.
pub const MAX_NPCS_PER_SPOT: u32 = 6;

/// Which regions of a new world receive spot detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSelection {
    /// Every region.
    #[default]
    All,
    /// No region; the world stops at outlined regions.
    None,
    /// The first `n` regions by position.
    First(u32),
}

impl RegionSelection {
    /// How many of `available` regions are selected.
    #[must_use]
    pub fn count(self, available: usize) -> usize {
        match self {
            Self::All => available,
            Self::None => 0,
            Self::First(n) => usize::try_from(n).map_or(available, |n| n.min(available)),
        }
    }
}

/// Command to generate a complete world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateWorld {
    /// Free-text theme, e.g. "a desert of glass".
    pub theme: String,
    /// Regions to request.
    pub region_count: u32,
    /// Spots to request per detailed region.
    pub spot_count: u32,
    /// NPCs to generate per spot.
    pub npcs_per_spot: u32,
    /// Regions that receive spot detail.
    #[serde(default)]
    pub detail: RegionSelection,
}

impl GenerateWorld {
    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank theme or counts out of
    /// range.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.theme.trim().is_empty() {
            return Err(DomainError::Validation("theme must not be empty".into()));
        }
        validate_list_count("region_count", self.region_count)?;
        validate_list_count("spot_count", self.spot_count)?;
        validate_npc_count(self.npcs_per_spot)
    }
}

/// Command to generate spot detail for one outlined region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRegionDetails {
    /// Owning world.
    pub world_id: Uuid,
    /// Region to detail.
    pub region_id: Uuid,
    /// Spots to request.
    pub spot_count: u32,
    /// NPCs to generate per spot.
    pub npcs_per_spot: u32,
}

impl GenerateRegionDetails {
    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for counts out of range.
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_list_count("spot_count", self.spot_count)?;
        validate_npc_count(self.npcs_per_spot)
    }
}

fn validate_list_count(field: &str, value: u32) -> Result<(), DomainError> {
    if (1..=MAX_LIST_COUNT).contains(&value) {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "{field} must be between 1 and {MAX_LIST_COUNT}, got {value}"
        )))
    }
}

fn validate_npc_count(value: u32) -> Result<(), DomainError> {
    if value <= MAX_NPCS_PER_SPOT {
        Ok(())
    } else {
        Err(DomainError::Validation(format!(
            "npcs_per_spot must be at most {MAX_NPCS_PER_SPOT}, got {value}"
        )))
    }
}
