//! Integration tests for world generation over HTTP.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use worldforge_generation::domain::call::CallKind;
use worldforge_test_support::{CannedTextGenerator, FailingImageGenerator, StaticImageGenerator};

#[tokio::test]
async fn test_world_generation_round_trip() {
    let app = common::build_test_app(
        Arc::new(CannedTextGenerator::new()),
        Arc::new(StaticImageGenerator::default()),
    );

    // POST /api/v1/worlds/generate
    let (status, json) = common::post_json(
        app.router(),
        "/api/v1/worlds/generate",
        &serde_json::json!({
            "theme": "a lantern-lit archipelago",
            "region_count": 2,
            "spot_count": 2,
            "npcs_per_spot": 1
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let task_id = json["task_id"].as_str().unwrap().to_owned();

    // GET /api/v1/tasks/{task_id} until terminal
    let task = common::poll_task(&app, &task_id).await;
    assert_eq!(task["status"], "completed");
    assert_eq!(task["progress"], 100);
    assert_eq!(task["kind"], "generate_world");
    let world_id = task["result"]["world"]["id"].as_str().unwrap().to_owned();

    // GET /api/v1/worlds/{world_id}
    let (status, world) = common::get_json(app.router(), &format!("/api/v1/worlds/{world_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(world, task["result"]);
    assert_eq!(world["world"]["status"], "ready");
    let regions = world["regions"].as_array().unwrap();
    assert_eq!(regions.len(), 2);
    for region in regions {
        assert_eq!(region["region"]["status"], "ready");
        assert_eq!(region["spots"].as_array().unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_outlined_world_can_be_detailed_and_extended() {
    let app = common::build_test_app(
        Arc::new(CannedTextGenerator::new()),
        Arc::new(StaticImageGenerator::default()),
    );

    let (_, json) = common::post_json(
        app.router(),
        "/api/v1/worlds/generate",
        &serde_json::json!({
            "theme": "salt flats",
            "region_count": 1,
            "spot_count": 1,
            "npcs_per_spot": 0,
            "detail": "none"
        }),
    )
    .await;
    let task = common::poll_task(&app, json["task_id"].as_str().unwrap()).await;
    assert_eq!(task["status"], "completed");
    let world_id = task["result"]["world"]["id"].as_str().unwrap().to_owned();
    let region = &task["result"]["regions"][0]["region"];
    assert_eq!(region["status"], "outlined");
    let region_id = region["id"].as_str().unwrap().to_owned();

    // Detail the outlined region.
    let (status, json) = common::post_json(
        app.router(),
        &format!("/api/v1/worlds/{world_id}/regions/{region_id}/generate"),
        &serde_json::json!({ "spot_count": 2, "npcs_per_spot": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let task = common::poll_task(&app, json["task_id"].as_str().unwrap()).await;
    assert_eq!(task["status"], "completed");
    let npc_id = task["result"]["spots"][0]["npcs"][0]["id"]
        .as_str()
        .unwrap()
        .to_owned();

    // Vehicle and dialog.
    let (status, vehicle) = common::post_empty(
        app.router(),
        &format!("/api/v1/worlds/{world_id}/vehicles/generate"),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let (status, dialog) = common::post_empty(
        app.router(),
        &format!("/api/v1/worlds/{world_id}/npcs/{npc_id}/dialog"),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let vehicle = common::poll_task(&app, vehicle["task_id"].as_str().unwrap()).await;
    let dialog = common::poll_task(&app, dialog["task_id"].as_str().unwrap()).await;
    assert_eq!(vehicle["status"], "completed");
    assert_eq!(dialog["status"], "completed");

    let (_, world) = common::get_json(app.router(), &format!("/api/v1/worlds/{world_id}")).await;
    assert_eq!(world["regions"][0]["region"]["status"], "ready");
    assert_eq!(world["vehicles"].as_array().unwrap().len(), 1);
    let npc = &world["regions"][0]["spots"][0]["npcs"][0];
    assert_eq!(npc["dialog"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_image_outage_still_completes_and_is_audited() {
    let app = common::build_test_app(
        Arc::new(CannedTextGenerator::new()),
        Arc::new(FailingImageGenerator::default()),
    );

    let (_, json) = common::post_json(
        app.router(),
        "/api/v1/worlds/generate",
        &serde_json::json!({
            "theme": "frozen orchards",
            "region_count": 1,
            "spot_count": 1,
            "npcs_per_spot": 1
        }),
    )
    .await;
    let task = common::poll_task(&app, json["task_id"].as_str().unwrap()).await;

    assert_eq!(task["status"], "completed");
    assert!(task["result"]["world"]["cover_image_url"].is_null());
    let failed_images = app
        .store
        .call_records()
        .await
        .iter()
        .filter(|record| record.kind == CallKind::Image && !record.success)
        .count();
    // World cover, region cover, spot image, and one portrait.
    assert_eq!(failed_images, 4);
}

#[tokio::test]
async fn test_failed_job_reports_its_error() {
    let app = common::build_test_app(
        Arc::new(CannedTextGenerator::new().failing(CallKind::WorldDescription)),
        Arc::new(StaticImageGenerator::default()),
    );

    let (_, json) = common::post_json(
        app.router(),
        "/api/v1/worlds/generate",
        &serde_json::json!({
            "theme": "copper canyons",
            "region_count": 1,
            "spot_count": 1,
            "npcs_per_spot": 0
        }),
    )
    .await;
    let task = common::poll_task(&app, json["task_id"].as_str().unwrap()).await;

    assert_eq!(task["status"], "failed");
    assert!(task["result"].is_null());
    assert!(
        task["error"]
            .as_str()
            .unwrap()
            .starts_with("world stage failed")
    );
    let (status, running) = common::get_json(app.router(), "/api/v1/tasks").await;
    assert_eq!(status, StatusCode::OK);
    assert!(running.as_array().unwrap().is_empty());
}
