//! Prompt builders for each call the orchestrator makes.
//!
//! Each text prompt names the JSON shape the payload parser expects.

use crate::domain::entities::{Npc, Region, Spot, Vehicle, World};

/// World description prompt.
#[must_use]
pub fn world_description(theme: &str) -> String {
    format!(
        "Invent a fictional world for the theme \"{theme}\". \
         Reply as {{\"name\": string, \"description\": string, \"tone\": string}}."
    )
}

/// Batched region list prompt.
#[must_use]
pub fn region_list(world: &World, count: usize) -> String {
    format!(
        "The world {} is described as: {} Describe {count} distinct regions of it. \
         Reply as {{\"regions\": [{{\"name\": string, \"description\": string, \"climate\": string}}]}}.",
        world.name, world.description
    )
}

/// Spot list prompt for one region; the reply order is the tour route.
#[must_use]
pub fn spot_list(world: &World, region: &Region, count: usize) -> String {
    format!(
        "In the world {}, the region {} is described as: {} \
         List {count} places a traveller would visit there, in the order of a walking tour. \
         Reply as {{\"spots\": [{{\"name\": string, \"description\": string, \"kind\": string}}]}}.",
        world.name, region.name, region.description
    )
}

/// NPC prompt for a spot. `existing` holds the names already present so the
/// backend can avoid duplicates.
#[must_use]
pub fn npc(world: &World, region: &Region, spot: &Spot, existing: &[String]) -> String {
    let others = if existing.is_empty() {
        String::new()
    } else {
        format!(" Do not reuse these names: {}.", existing.join(", "))
    };
    format!(
        "In the world {}, region {}, describe one character found at {} ({}).{others} \
         Reply as {{\"name\": string, \"role\": string, \"personality\": string, \
         \"appearance\": string, \"greeting\": string}}.",
        world.name, region.name, spot.name, spot.description
    )
}

/// Dialog prompt for an existing NPC.
#[must_use]
pub fn dialog(world: &World, npc: &Npc) -> String {
    format!(
        "In the world {}, {} the {} ({}) is approached by a traveller. \
         Write what they say. Reply as {{\"lines\": [string]}}.",
        world.name, npc.name, npc.role, npc.personality
    )
}

/// Vehicle prompt.
#[must_use]
pub fn vehicle(world: &World) -> String {
    format!(
        "Describe a vehicle travellers use to cross the world {} ({}). \
         Reply as {{\"name\": string, \"description\": string, \"capacity\": integer}}.",
        world.name, world.tone
    )
}

/// World cover image prompt.
#[must_use]
pub fn world_cover(world: &World) -> String {
    format!("Cover art for the world {}: {}", world.name, world.description)
}

/// Region cover image prompt.
#[must_use]
pub fn region_cover(world: &World, region: &Region) -> String {
    format!(
        "Landscape of {}, a {} region of {}: {}",
        region.name, region.climate, world.name, region.description
    )
}

/// Spot image prompt.
#[must_use]
pub fn spot_image(region: &Region, spot: &Spot) -> String {
    format!(
        "{} in {}, a {}: {}",
        spot.name, region.name, spot.kind, spot.description
    )
}

/// NPC portrait prompt.
#[must_use]
pub fn npc_portrait(npc: &Npc) -> String {
    format!("Portrait of {}, {}: {}", npc.name, npc.role, npc.appearance)
}

/// Vehicle image prompt.
#[must_use]
pub fn vehicle_image(vehicle: &Vehicle) -> String {
    format!("{}: {}", vehicle.name, vehicle.description)
}
