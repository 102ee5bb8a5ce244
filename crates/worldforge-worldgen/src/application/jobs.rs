//! Task Polling Interface: submits orchestrator operations to the task queue.
//!
//! Each function returns the task ID at once; callers poll
//! [`TaskQueue::get`] for status, progress, result, and error.

use uuid::Uuid;
use worldforge_tasks::application::queue::TaskQueue;
use worldforge_tasks::domain::task::TaskId;

use crate::application::orchestrator::WorldGenerator;
use crate::domain::commands::{GenerateRegionDetails, GenerateWorld};

/// Task kind for full world generation.
pub const GENERATE_WORLD: &str = "generate_world";
/// Task kind for spot detail of one region.
pub const GENERATE_REGION_DETAILS: &str = "generate_region_details";
/// Task kind for vehicle generation.
pub const GENERATE_VEHICLE: &str = "generate_vehicle";
/// Task kind for NPC dialog generation.
pub const GENERATE_NPC_DIALOG: &str = "generate_npc_dialog";

/// Queues a full world generation. The task result is the `WorldTree`.
pub fn submit_generate_world_job(
    queue: &TaskQueue,
    generator: &WorldGenerator,
    request: GenerateWorld,
) -> TaskId {
    let generator = generator.clone();
    queue
        .submit(GENERATE_WORLD, move |progress| async move {
            generator.generate_world(&request, &progress).await
        })
        .id
}

/// Queues spot detail for one region. The task result is the `RegionTree`.
///
/// Progress moves in four steps: spots, NPCs, images, ready.
pub fn submit_generate_region_details_job(
    queue: &TaskQueue,
    generator: &WorldGenerator,
    command: GenerateRegionDetails,
) -> TaskId {
    let generator = generator.clone();
    queue
        .submit(GENERATE_REGION_DETAILS, move |progress| async move {
            generator.generate_region_details(&command, &progress).await
        })
        .id
}

/// Queues a vehicle for a world. The task result is the `Vehicle`.
pub fn submit_generate_vehicle_job(
    queue: &TaskQueue,
    generator: &WorldGenerator,
    world_id: Uuid,
) -> TaskId {
    let generator = generator.clone();
    queue
        .submit(GENERATE_VEHICLE, move |_progress| async move {
            generator.generate_vehicle(world_id).await
        })
        .id
}

/// Queues dialog for an NPC. The task result is the updated `Npc`.
pub fn submit_generate_npc_dialog_job(
    queue: &TaskQueue,
    generator: &WorldGenerator,
    world_id: Uuid,
    npc_id: Uuid,
) -> TaskId {
    let generator = generator.clone();
    queue
        .submit(GENERATE_NPC_DIALOG, move |_progress| async move {
            generator.generate_npc_dialog(world_id, npc_id).await
        })
        .id
}
