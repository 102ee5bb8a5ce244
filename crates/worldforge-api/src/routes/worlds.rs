//! Routes that submit generation jobs and read generated worlds.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;
use worldforge_core::error::DomainError;
use worldforge_worldgen::application::jobs;
use worldforge_worldgen::domain::commands::{GenerateRegionDetails, GenerateWorld, RegionSelection};
use worldforge_worldgen::domain::entities::WorldTree;

use super::TaskAccepted;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /generate.
#[derive(Debug, Deserialize)]
pub struct GenerateWorldRequest {
    /// Free-text theme.
    pub theme: String,
    /// Regions to request, 1-12.
    pub region_count: u32,
    /// Spots per detailed region, 1-12.
    pub spot_count: u32,
    /// NPCs per spot, 0-6.
    pub npcs_per_spot: u32,
    /// Regions that receive spot detail; every region when omitted.
    #[serde(default)]
    pub detail: RegionSelection,
}

/// Request body for POST /{world_id}/regions/{region_id}/generate.
#[derive(Debug, Deserialize)]
pub struct GenerateRegionRequest {
    /// Spots to request, 1-12.
    pub spot_count: u32,
    /// NPCs per spot, 0-6.
    pub npcs_per_spot: u32,
}

type Accepted = (StatusCode, Json<TaskAccepted>);

fn accepted(task_id: worldforge_tasks::domain::task::TaskId) -> Accepted {
    (StatusCode::ACCEPTED, Json(TaskAccepted { task_id }))
}

/// POST /generate
#[instrument(skip_all, fields(region_count = request.region_count))]
async fn generate_world(
    State(state): State<AppState>,
    Json(request): Json<GenerateWorldRequest>,
) -> Result<Accepted, ApiError> {
    let command = GenerateWorld {
        theme: request.theme,
        region_count: request.region_count,
        spot_count: request.spot_count,
        npcs_per_spot: request.npcs_per_spot,
        detail: request.detail,
    };
    command.validate()?;

    let task_id = jobs::submit_generate_world_job(&state.queue, &state.generator, command);
    info!(%task_id, "world generation accepted");
    Ok(accepted(task_id))
}

/// POST /{world_id}/regions/{region_id}/generate
#[instrument(skip_all, fields(%world_id, %region_id))]
async fn generate_region_details(
    State(state): State<AppState>,
    Path((world_id, region_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<GenerateRegionRequest>,
) -> Result<Accepted, ApiError> {
    let command = GenerateRegionDetails {
        world_id,
        region_id,
        spot_count: request.spot_count,
        npcs_per_spot: request.npcs_per_spot,
    };
    command.validate()?;

    let task_id = jobs::submit_generate_region_details_job(&state.queue, &state.generator, command);
    info!(%task_id, "region detail accepted");
    Ok(accepted(task_id))
}

/// POST /{world_id}/vehicles/generate
#[instrument(skip_all, fields(%world_id))]
async fn generate_vehicle(
    State(state): State<AppState>,
    Path(world_id): Path<Uuid>,
) -> Accepted {
    let task_id = jobs::submit_generate_vehicle_job(&state.queue, &state.generator, world_id);
    info!(%task_id, "vehicle generation accepted");
    accepted(task_id)
}

/// POST /{world_id}/npcs/{npc_id}/dialog
#[instrument(skip_all, fields(%world_id, %npc_id))]
async fn generate_npc_dialog(
    State(state): State<AppState>,
    Path((world_id, npc_id)): Path<(Uuid, Uuid)>,
) -> Accepted {
    let task_id =
        jobs::submit_generate_npc_dialog_job(&state.queue, &state.generator, world_id, npc_id);
    info!(%task_id, "dialog generation accepted");
    accepted(task_id)
}

/// GET /{world_id}
async fn get_world(
    State(state): State<AppState>,
    Path(world_id): Path<Uuid>,
) -> Result<Json<WorldTree>, ApiError> {
    let tree = state
        .entities
        .get_world(world_id)
        .await?
        .ok_or_else(|| DomainError::not_found("world", world_id))?;
    Ok(Json(tree))
}

/// Returns the router for world generation.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_world))
        .route("/{world_id}", get(get_world))
        .route(
            "/{world_id}/regions/{region_id}/generate",
            post(generate_region_details),
        )
        .route("/{world_id}/vehicles/generate", post(generate_vehicle))
        .route("/{world_id}/npcs/{npc_id}/dialog", post(generate_npc_dialog))
}
