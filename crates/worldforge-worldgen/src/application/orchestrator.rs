//! Generation Orchestrator.
//!
//! Sequences the world → regions → spots → NPCs pipeline, fans each level
//! out into concurrent remote calls, and persists every entity as soon as it
//! is built or changes status. Every fan-out is joined all-settled: a failed
//! branch never cancels its siblings.
//!
//! Concurrent branches each hold a mutable borrow of a disjoint subtree, so
//! the in-memory tree needs no locking.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use worldforge_core::clock::Clock;
use worldforge_core::error::DomainError;
use worldforge_core::progress::{NoopProgress, ProgressReporter};
use worldforge_generation::application::client::GenerationClient;
use worldforge_generation::domain::call::CallCorrelation;
use worldforge_generation::domain::payload::{
    DialogScript, NpcProfile, RegionList, SpotList, VehicleDescription, WorldDescription,
};

use crate::application::detached::DetachedImage;
use crate::application::prompts;
use crate::domain::commands::{GenerateRegionDetails, GenerateWorld};
use crate::domain::entities::{Npc, Region, RegionTree, Spot, SpotTree, Vehicle, World, WorldTree};
use crate::domain::error::{OrchestrationError, Stage};
use crate::domain::ports::EntityRepository;
use crate::domain::status::{Generable, GenerationStatus, RegionStatus, StatusMachine};

/// Progress steps that do not depend on how many regions are detailed:
/// world, regions, and the final settle.
const FIXED_STEPS: u32 = 3;

/// Progress steps of one region's detail: spots, NPCs, images, ready.
const REGION_DETAIL_STEPS: u32 = 4;

fn step_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Returns the first error among settled branch results.
fn settle(results: Vec<Result<(), OrchestrationError>>) -> Result<(), OrchestrationError> {
    results.into_iter().collect()
}

/// Runs generation pipelines against a generation client and an entity
/// repository.
#[derive(Clone)]
pub struct WorldGenerator {
    client: GenerationClient,
    repository: Arc<dyn EntityRepository>,
    clock: Arc<dyn Clock>,
}

impl WorldGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(
        client: GenerationClient,
        repository: Arc<dyn EntityRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            repository,
            clock,
        }
    }

    /// Generates a whole world: description, regions, and spot detail for
    /// the regions selected by `request.detail`.
    ///
    /// A spot-list failure marks only its region `error`; the job carries
    /// on. Progress is reported after the world, after the regions, and
    /// after each detailed region, out of `3 + detailed regions` steps.
    ///
    /// Once the world is described, every failure joins the detached cover
    /// and persists the world as `error` before it is returned.
    ///
    /// # Errors
    ///
    /// Returns `StageFailed` when the world description or the region list
    /// cannot be generated, `Domain` for invalid requests and persistence
    /// failures.
    #[instrument(skip_all, fields(theme = %request.theme, region_count = request.region_count))]
    pub async fn generate_world(
        &self,
        request: &GenerateWorld,
        progress: &dyn ProgressReporter,
    ) -> Result<WorldTree, OrchestrationError> {
        request.validate()?;
        let planned = request.detail.count(request.region_count as usize);

        let (world, cover) = self.generate_world_description(&request.theme).await?;
        progress.report(1, FIXED_STEPS + step_count(planned), "World described");

        let mut tree = WorldTree {
            world,
            regions: Vec::new(),
            vehicles: Vec::new(),
        };
        let outcome = self.outline_and_detail(&mut tree, request, progress).await;
        tree.world.cover_image_url = cover.join().await;

        let total = match outcome {
            Ok(total) => total,
            Err(err) => {
                let world = &mut tree.world;
                world.fail(err.to_string(), self.clock.now());
                if let Err(save_err) = self.repository.save_world(world).await {
                    warn!(world_id = %world.id, error = %save_err, "failed to persist world error");
                }
                return Err(err);
            }
        };

        let world = &mut tree.world;
        world.advance(GenerationStatus::Ready, self.clock.now());
        self.repository.save_world(world).await?;

        info!(
            world_id = %world.id,
            regions = tree.regions.len(),
            "world ready"
        );
        progress.report(total, total, "World ready");
        Ok(tree)
    }

    /// Stages 2 to 4 of `generate_world`. Leaves the world in
    /// `generating_image`, waiting on its cover, and returns the progress
    /// total.
    async fn outline_and_detail(
        &self,
        tree: &mut WorldTree,
        request: &GenerateWorld,
        progress: &dyn ProgressReporter,
    ) -> Result<u32, OrchestrationError> {
        let regions = self
            .generate_regions(&tree.world, request.region_count)
            .await?;
        tree.regions = regions.into_iter().map(RegionTree::outlined).collect();

        let selected = request.detail.count(tree.regions.len());
        let total = FIXED_STEPS + step_count(selected);
        progress.report(2, total, "Regions outlined");

        let WorldTree { world, regions, .. } = tree;
        for (index, region) in regions.iter_mut().take(selected).enumerate() {
            match self
                .detail_region(
                    world,
                    region,
                    request.spot_count,
                    request.npcs_per_spot,
                    &NoopProgress,
                )
                .await
            {
                Ok(()) => {}
                Err(OrchestrationError::StageFailed { stage, message }) => {
                    warn!(
                        world_id = %world.id,
                        region_id = %region.region.id,
                        %stage,
                        error = %message,
                        "region detail failed; continuing with remaining regions"
                    );
                }
                Err(err) => {
                    let region = &mut region.region;
                    if region.fail(err.to_string(), self.clock.now()) {
                        if let Err(save_err) = self.repository.save_region(region).await {
                            warn!(region_id = %region.id, error = %save_err, "failed to persist region error");
                        }
                    }
                    return Err(err);
                }
            }
            let done = step_count(index + 1);
            progress.report(
                2 + done,
                total,
                &format!("Region {done}/{selected} detailed"),
            );
        }

        world.advance(GenerationStatus::GeneratingImage, self.clock.now());
        self.repository.save_world(world).await?;
        Ok(total)
    }

    /// Stage 1: describes and persists a world, then starts its cover image
    /// without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns `StageFailed` when the description cannot be generated;
    /// nothing is persisted in that case.
    #[instrument(skip(self))]
    pub async fn generate_world_description(
        &self,
        theme: &str,
    ) -> Result<(World, DetachedImage), OrchestrationError> {
        let world_id = Uuid::new_v4();
        let description = self
            .client
            .text::<WorldDescription>(
                prompts::world_description(theme),
                CallCorrelation::world(world_id),
            )
            .await
            .into_result()
            .map_err(|failure| OrchestrationError::stage(Stage::World, failure.error))?
            .value;

        let world = World::described(world_id, theme, description, self.clock.now());
        self.repository.save_world(&world).await?;
        info!(world_id = %world.id, name = %world.name, "world described");

        let cover = DetachedImage::spawn(
            self.client.clone(),
            prompts::world_cover(&world),
            CallCorrelation::world(world.id),
        );
        Ok((world, cover))
    }

    /// Stage 2: describes `count` regions in one call, persists them, and
    /// illustrates them concurrently. Each region ends `outlined`.
    ///
    /// # Errors
    ///
    /// Returns `StageFailed` when the region list cannot be generated and
    /// `Domain` when persistence fails.
    #[instrument(skip_all, fields(world_id = %world.id, count = count))]
    pub async fn generate_regions(
        &self,
        world: &World,
        count: u32,
    ) -> Result<Vec<Region>, OrchestrationError> {
        let count = count as usize;
        let mut drafts = self
            .client
            .text::<RegionList>(
                prompts::region_list(world, count),
                CallCorrelation::world(world.id),
            )
            .await
            .into_result()
            .map_err(|failure| OrchestrationError::stage(Stage::RegionList, failure.error))?
            .value
            .regions;
        drafts.truncate(count);

        let now = self.clock.now();
        let mut regions: Vec<Region> = drafts
            .into_iter()
            .enumerate()
            .map(|(position, draft)| Region::described(world.id, step_count(position), draft, now))
            .collect();
        for region in &regions {
            self.repository.save_region(region).await?;
        }

        let results = join_all(
            regions
                .iter_mut()
                .map(|region| self.illustrate_region(world, region)),
        )
        .await;
        settle(results)?;

        info!(world_id = %world.id, regions = regions.len(), "regions outlined");
        Ok(regions)
    }

    /// Stages 3 and 4 for one outlined region of a persisted world.
    ///
    /// # Errors
    ///
    /// Returns `Domain(NotFound)` for an unknown world or region,
    /// `Domain(Validation)` for invalid counts or a region that is not
    /// `outlined`, and `StageFailed` when the spot list cannot be generated
    /// (the region is persisted as `error`).
    ///
    /// Progress is reported after the spot list, after the NPCs, after the
    /// images, and when the region is ready.
    #[instrument(skip_all, fields(world_id = %command.world_id, region_id = %command.region_id))]
    pub async fn generate_region_details(
        &self,
        command: &GenerateRegionDetails,
        progress: &dyn ProgressReporter,
    ) -> Result<RegionTree, OrchestrationError> {
        command.validate()?;
        let tree = self
            .repository
            .get_world(command.world_id)
            .await?
            .ok_or_else(|| DomainError::not_found("world", command.world_id))?;
        let WorldTree { world, regions, .. } = tree;
        let mut region = regions
            .into_iter()
            .find(|tree| tree.region.id == command.region_id)
            .ok_or_else(|| DomainError::not_found("region", command.region_id))?;
        if region.region.status() != RegionStatus::Outlined {
            return Err(DomainError::Validation(format!(
                "region {} is {}, not outlined",
                region.region.id,
                region.region.status().as_str()
            ))
            .into());
        }

        self.detail_region(
            &world,
            &mut region,
            command.spot_count,
            command.npcs_per_spot,
            progress,
        )
        .await?;
        Ok(region)
    }

    /// Describes one vehicle for a persisted world and illustrates it.
    ///
    /// # Errors
    ///
    /// Returns `Domain(NotFound)` for an unknown world, `StageFailed` when
    /// the description cannot be generated, and `Domain` when persistence
    /// fails.
    #[instrument(skip(self))]
    pub async fn generate_vehicle(&self, world_id: Uuid) -> Result<Vehicle, OrchestrationError> {
        let world = self.load_world(world_id).await?.world;
        let vehicle_id = Uuid::new_v4();
        let correlation = CallCorrelation::world(world.id).with_vehicle(vehicle_id);

        let description = self
            .client
            .text::<VehicleDescription>(prompts::vehicle(&world), correlation)
            .await
            .into_result()
            .map_err(|failure| OrchestrationError::stage(Stage::Vehicle, failure.error))?
            .value;

        let mut vehicle = Vehicle::described(vehicle_id, world.id, description, self.clock.now());
        self.repository.save_vehicle(&vehicle).await?;

        vehicle.image_url = self
            .client
            .image(prompts::vehicle_image(&vehicle), correlation)
            .await
            .ok()
            .map(|image| image.url);
        vehicle.advance(GenerationStatus::Ready, self.clock.now());
        self.repository.save_vehicle(&vehicle).await?;

        info!(
            world_id = %world.id,
            vehicle_id = %vehicle.id,
            illustrated = vehicle.image_url.is_some(),
            "vehicle ready"
        );
        Ok(vehicle)
    }

    /// Writes dialog lines for an existing NPC.
    ///
    /// # Errors
    ///
    /// Returns `Domain(NotFound)` for an unknown world or NPC and
    /// `StageFailed` when the dialog cannot be generated; the NPC is left
    /// untouched in that case.
    #[instrument(skip(self))]
    pub async fn generate_npc_dialog(
        &self,
        world_id: Uuid,
        npc_id: Uuid,
    ) -> Result<Npc, OrchestrationError> {
        let tree = self.load_world(world_id).await?;
        let mut npc = tree
            .npc(npc_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("npc", npc_id))?;

        let mut correlation = CallCorrelation::world(world_id).with_npc(npc.id);
        if let Some(spot_id) = npc.home_spot_id {
            correlation = correlation.with_spot(spot_id);
        }
        let script = self
            .client
            .text::<DialogScript>(prompts::dialog(&tree.world, &npc), correlation)
            .await
            .into_result()
            .map_err(|failure| OrchestrationError::stage(Stage::Dialog, failure.error))?
            .value;

        npc.dialog = script
            .lines
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect();
        npc.lifecycle.updated_at = self.clock.now();
        self.repository.save_npc(&npc).await?;

        info!(npc_id = %npc.id, lines = npc.dialog.len(), "npc dialog written");
        Ok(npc)
    }

    async fn load_world(&self, world_id: Uuid) -> Result<WorldTree, OrchestrationError> {
        self.repository
            .get_world(world_id)
            .await?
            .ok_or_else(|| DomainError::not_found("world", world_id).into())
    }

    /// Cover image for one region; the region ends `outlined` either way.
    async fn illustrate_region(
        &self,
        world: &World,
        region: &mut Region,
    ) -> Result<(), OrchestrationError> {
        region.advance(RegionStatus::GeneratingImage, self.clock.now());
        self.repository.save_region(region).await?;

        let correlation = CallCorrelation::world(world.id).with_region(region.id);
        region.cover_image_url = self
            .client
            .image(prompts::region_cover(world, region), correlation)
            .await
            .ok()
            .map(|image| image.url);
        if region.cover_image_url.is_none() {
            warn!(region_id = %region.id, "region cover failed; region continues without one");
        }

        region.advance(RegionStatus::Outlined, self.clock.now());
        self.repository.save_region(region).await?;
        Ok(())
    }

    /// Spot list, NPCs, and images for one region.
    #[instrument(skip_all, fields(world_id = %world.id, region_id = %tree.region.id))]
    async fn detail_region(
        &self,
        world: &World,
        tree: &mut RegionTree,
        spot_count: u32,
        npcs_per_spot: u32,
        progress: &dyn ProgressReporter,
    ) -> Result<(), OrchestrationError> {
        let RegionTree { region, spots } = tree;
        region.advance(RegionStatus::GeneratingSpots, self.clock.now());
        self.repository.save_region(region).await?;

        let count = spot_count as usize;
        let outcome = self
            .client
            .text::<SpotList>(
                prompts::spot_list(world, region, count),
                CallCorrelation::world(world.id).with_region(region.id),
            )
            .await
            .into_result();
        let mut drafts = match outcome {
            Ok(success) => success.value.spots,
            Err(failure) => {
                let err = OrchestrationError::stage(Stage::SpotList, failure.error);
                region.fail(err.to_string(), self.clock.now());
                self.repository.save_region(region).await?;
                return Err(err);
            }
        };
        drafts.truncate(count);

        let now = self.clock.now();
        for (position, draft) in drafts.into_iter().enumerate() {
            let spot = Spot::described(world.id, region.id, step_count(position), draft, now);
            self.repository.save_spot(&spot).await?;
            spots.push(SpotTree {
                spot,
                npcs: Vec::new(),
            });
        }
        info!(region_id = %region.id, spots = spots.len(), "spots described");
        progress.report(1, REGION_DETAIL_STEPS, "Spots described");

        region.advance(RegionStatus::GeneratingImages, self.clock.now());
        self.repository.save_region(region).await?;

        self.populate_and_illustrate(world, region, spots, npcs_per_spot, progress)
            .await?;

        region.advance(RegionStatus::Ready, self.clock.now());
        self.repository.save_region(region).await?;
        info!(region_id = %region.id, spots = spots.len(), "region ready");
        progress.report(REGION_DETAIL_STEPS, REGION_DETAIL_STEPS, "Region ready");
        Ok(())
    }

    /// Stage 4: NPC sequences per spot, then every spot image and portrait
    /// at once. Spots end `ready`.
    async fn populate_and_illustrate(
        &self,
        world: &World,
        region: &Region,
        spots: &mut [SpotTree],
        npcs_per_spot: u32,
        progress: &dyn ProgressReporter,
    ) -> Result<(), OrchestrationError> {
        let populated = join_all(
            spots
                .iter_mut()
                .map(|spot| self.populate_spot(world, region, spot, npcs_per_spot)),
        )
        .await;
        settle(populated)?;
        progress.report(2, REGION_DETAIL_STEPS, "NPCs generated");

        let mut spot_refs = Vec::with_capacity(spots.len());
        let mut npc_refs = Vec::new();
        for SpotTree { spot, npcs } in spots.iter_mut() {
            spot_refs.push(spot);
            npc_refs.extend(npcs.iter_mut());
        }
        let (spot_images, portraits) = futures::join!(
            join_all(
                spot_refs
                    .into_iter()
                    .map(|spot| self.illustrate_spot(region, spot))
            ),
            join_all(
                npc_refs
                    .into_iter()
                    .map(|npc| self.illustrate_npc(region.id, npc))
            ),
        );
        settle(portraits)?;
        settle(spot_images)?;
        progress.report(3, REGION_DETAIL_STEPS, "Images settled");

        for SpotTree { spot, .. } in spots.iter_mut() {
            spot.advance(GenerationStatus::Ready, self.clock.now());
            self.repository.save_spot(spot).await?;
        }
        Ok(())
    }

    /// Generates a spot's NPCs one after another. A failed NPC call creates
    /// no NPC; the spot continues with the rest.
    async fn populate_spot(
        &self,
        world: &World,
        region: &Region,
        tree: &mut SpotTree,
        npcs_per_spot: u32,
    ) -> Result<(), OrchestrationError> {
        let SpotTree { spot, npcs } = tree;
        let correlation = CallCorrelation::world(world.id)
            .with_region(region.id)
            .with_spot(spot.id);

        for _ in 0..npcs_per_spot {
            let existing: Vec<String> = npcs.iter().map(|npc| npc.name.clone()).collect();
            let outcome = self
                .client
                .text::<NpcProfile>(prompts::npc(world, region, spot, &existing), correlation)
                .await
                .into_result();
            match outcome {
                Ok(success) => {
                    let npc = Npc::profiled(world.id, Some(spot.id), success.value, self.clock.now());
                    self.repository.save_npc(&npc).await?;
                    spot.npc_ids.push(npc.id);
                    npcs.push(npc);
                }
                Err(failure) => {
                    warn!(
                        spot_id = %spot.id,
                        error = %failure.error,
                        attempts = failure.attempts,
                        "npc generation failed; spot continues without it"
                    );
                }
            }
        }

        spot.advance(GenerationStatus::GeneratingImage, self.clock.now());
        self.repository.save_spot(spot).await?;
        Ok(())
    }

    /// Spot image. The spot is marked ready by the caller once its NPCs'
    /// portraits have settled too.
    async fn illustrate_spot(&self, region: &Region, spot: &mut Spot) -> Result<(), OrchestrationError> {
        let correlation = CallCorrelation::world(spot.world_id)
            .with_region(region.id)
            .with_spot(spot.id);
        spot.image_url = self
            .client
            .image(prompts::spot_image(region, spot), correlation)
            .await
            .ok()
            .map(|image| image.url);
        if spot.image_url.is_none() {
            warn!(spot_id = %spot.id, "spot image failed; spot continues without one");
        }
        Ok(())
    }

    /// NPC portrait; the NPC is ready once the call settles.
    async fn illustrate_npc(&self, region_id: Uuid, npc: &mut Npc) -> Result<(), OrchestrationError> {
        let mut correlation = CallCorrelation::world(npc.world_id)
            .with_region(region_id)
            .with_npc(npc.id);
        if let Some(spot_id) = npc.home_spot_id {
            correlation = correlation.with_spot(spot_id);
        }
        npc.portrait_url = self
            .client
            .image(prompts::npc_portrait(npc), correlation)
            .await
            .ok()
            .map(|image| image.url);
        if npc.portrait_url.is_none() {
            warn!(npc_id = %npc.id, "npc portrait failed; npc continues without one");
        }

        npc.advance(GenerationStatus::Ready, self.clock.now());
        self.repository.save_npc(npc).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use worldforge_generation::application::executor::CallExecutor;
    use worldforge_generation::application::recorder::CallRecorder;
    use worldforge_generation::application::settings::{GenerationSettings, RetryPolicy};
    use worldforge_generation::domain::call::CallKind;
    use worldforge_generation::domain::ports::{ImageGenerator, TextGenerator};
    use worldforge_test_support::{
        CannedTextGenerator, FailingImageGenerator, FailingTextGenerator, FixedClock,
        RecordingCallRecordRepository, StaticImageGenerator,
    };

    use super::*;
    use crate::domain::commands::RegionSelection;

    /// Records the status of every saved entity, in save order.
    #[derive(Debug, Default)]
    struct MockEntityRepository {
        saves: Mutex<Vec<(&'static str, Uuid, &'static str)>>,
        failing_spots: bool,
    }

    impl MockEntityRepository {
        fn failing_spots() -> Self {
            Self {
                failing_spots: true,
                ..Self::default()
            }
        }

        fn push(&self, entity: &'static str, id: Uuid, status: &'static str) {
            self.saves.lock().unwrap().push((entity, id, status));
        }

        fn history(&self, id: Uuid) -> Vec<&'static str> {
            self.saves
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, saved_id, _)| *saved_id == id)
                .map(|(_, _, status)| *status)
                .collect()
        }

        fn count(&self, entity: &'static str) -> usize {
            self.saves
                .lock()
                .unwrap()
                .iter()
                .filter(|(kind, _, _)| *kind == entity)
                .map(|(_, id, _)| *id)
                .collect::<HashSet<_>>()
                .len()
        }
    }

    #[async_trait]
    impl EntityRepository for MockEntityRepository {
        async fn save_world(&self, world: &World) -> Result<(), DomainError> {
            self.push("world", world.id, world.status().as_str());
            Ok(())
        }

        async fn save_region(&self, region: &Region) -> Result<(), DomainError> {
            self.push("region", region.id, region.status().as_str());
            Ok(())
        }

        async fn save_spot(&self, spot: &Spot) -> Result<(), DomainError> {
            if self.failing_spots {
                return Err(DomainError::Infrastructure("db down".into()));
            }
            self.push("spot", spot.id, spot.status().as_str());
            Ok(())
        }

        async fn save_npc(&self, npc: &Npc) -> Result<(), DomainError> {
            self.push("npc", npc.id, npc.status().as_str());
            Ok(())
        }

        async fn save_vehicle(&self, vehicle: &Vehicle) -> Result<(), DomainError> {
            self.push("vehicle", vehicle.id, vehicle.status().as_str());
            Ok(())
        }

        async fn get_world(&self, _world_id: Uuid) -> Result<Option<WorldTree>, DomainError> {
            Ok(None)
        }
    }

    #[derive(Debug, Default)]
    struct RecordingProgress {
        reports: Mutex<Vec<(u32, u32, String)>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, current: u32, total: u32, message: &str) {
            self.reports
                .lock()
                .unwrap()
                .push((current, total, message.to_owned()));
        }
    }

    struct Harness {
        generator: WorldGenerator,
        entities: Arc<MockEntityRepository>,
        records: Arc<RecordingCallRecordRepository>,
    }

    fn harness(text: Arc<dyn TextGenerator>, image: Arc<dyn ImageGenerator>) -> Harness {
        harness_with(text, image, MockEntityRepository::default())
    }

    fn harness_with(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        entities: MockEntityRepository,
    ) -> Harness {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::default());
        let records = Arc::new(RecordingCallRecordRepository::new());
        let entities = Arc::new(entities);
        let settings = GenerationSettings {
            text_policy: RetryPolicy::from_millis(2, 1, 1_000),
            image_policy: RetryPolicy::from_millis(2, 1, 1_000),
            ..GenerationSettings::default()
        };
        let client = GenerationClient::new(
            text,
            image,
            CallExecutor::new(CallRecorder::new(records.clone(), clock.clone())),
            settings,
        );
        Harness {
            generator: WorldGenerator::new(client, entities.clone(), clock),
            entities,
            records,
        }
    }

    fn request(detail: RegionSelection) -> GenerateWorld {
        GenerateWorld {
            theme: "a drowned kingdom".to_owned(),
            region_count: 2,
            spot_count: 2,
            npcs_per_spot: 1,
            detail,
        }
    }

    #[tokio::test]
    async fn test_generate_world_builds_full_tree_and_reports_progress() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(StaticImageGenerator::default()),
        );
        let progress = RecordingProgress::default();

        // Act
        let tree = h
            .generator
            .generate_world(&request(RegionSelection::All), &progress)
            .await
            .unwrap();

        // Assert
        assert_eq!(tree.world.status(), GenerationStatus::Ready);
        assert!(tree.world.cover_image_url.is_some());
        assert_eq!(tree.regions.len(), 2);
        for region in &tree.regions {
            assert_eq!(region.region.status(), RegionStatus::Ready);
            assert!(region.region.cover_image_url.is_some());
            assert_eq!(region.spots.len(), 2);
            for (position, spot) in region.spots.iter().enumerate() {
                assert_eq!(spot.spot.position as usize, position);
                assert_eq!(spot.spot.status(), GenerationStatus::Ready);
                assert!(spot.spot.image_url.is_some());
                assert_eq!(spot.npcs.len(), 1);
                assert_eq!(spot.spot.npc_ids, vec![spot.npcs[0].id]);
                assert_eq!(spot.npcs[0].status(), GenerationStatus::Ready);
                assert!(spot.npcs[0].portrait_url.is_some());
            }
        }
        let reports = progress.reports.lock().unwrap();
        let steps: Vec<(u32, u32)> = reports.iter().map(|(c, t, _)| (*c, *t)).collect();
        assert_eq!(steps, vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]);
        assert_eq!(reports.last().unwrap().2, "World ready");
    }

    #[tokio::test]
    async fn test_status_writes_only_move_forward() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(StaticImageGenerator::default()),
        );

        // Act
        let tree = h
            .generator
            .generate_world(&request(RegionSelection::All), &RecordingProgress::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(
            h.entities.history(tree.world.id),
            vec!["generating_text", "generating_image", "ready"]
        );
        let region = &tree.regions[0];
        assert_eq!(
            h.entities.history(region.region.id),
            vec![
                "generating_text",
                "generating_image",
                "outlined",
                "generating_spots",
                "generating_images",
                "ready",
            ]
        );
        assert_eq!(
            h.entities.history(region.spots[0].spot.id),
            vec!["generating_text", "generating_image", "ready"]
        );
        assert_eq!(
            h.entities.history(region.spots[0].npcs[0].id),
            vec!["generating_image", "ready"]
        );
    }

    #[tokio::test]
    async fn test_world_description_failure_persists_nothing() {
        // Arrange
        let h = harness(
            Arc::new(FailingTextGenerator::default()),
            Arc::new(StaticImageGenerator::default()),
        );

        // Act
        let err = h
            .generator
            .generate_world(&request(RegionSelection::All), &RecordingProgress::default())
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(
            err,
            OrchestrationError::StageFailed {
                stage: Stage::World,
                ..
            }
        ));
        assert_eq!(h.entities.count("world"), 0);
        assert_eq!(h.records.count(CallKind::WorldDescription, false), 1);
    }

    #[tokio::test]
    async fn test_detail_none_leaves_regions_outlined() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(StaticImageGenerator::default()),
        );
        let progress = RecordingProgress::default();

        // Act
        let tree = h
            .generator
            .generate_world(&request(RegionSelection::None), &progress)
            .await
            .unwrap();

        // Assert
        assert_eq!(tree.world.status(), GenerationStatus::Ready);
        assert!(
            tree.regions
                .iter()
                .all(|r| r.region.status() == RegionStatus::Outlined && r.spots.is_empty())
        );
        assert_eq!(h.entities.count("spot"), 0);
        let steps: Vec<(u32, u32)> = progress
            .reports
            .lock()
            .unwrap()
            .iter()
            .map(|(c, t, _)| (*c, *t))
            .collect();
        assert_eq!(steps, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_first_n_details_only_leading_regions() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(StaticImageGenerator::default()),
        );

        // Act
        let tree = h
            .generator
            .generate_world(&request(RegionSelection::First(1)), &RecordingProgress::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(tree.regions[0].region.status(), RegionStatus::Ready);
        assert_eq!(tree.regions[1].region.status(), RegionStatus::Outlined);
        assert!(tree.regions[1].spots.is_empty());
    }

    #[tokio::test]
    async fn test_failed_npc_call_creates_no_npc() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new().failing(CallKind::Npc)),
            Arc::new(StaticImageGenerator::default()),
        );

        // Act
        let tree = h
            .generator
            .generate_world(&request(RegionSelection::All), &RecordingProgress::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(h.entities.count("npc"), 0);
        for region in &tree.regions {
            assert_eq!(region.region.status(), RegionStatus::Ready);
            for spot in &region.spots {
                assert!(spot.npcs.is_empty());
                assert!(spot.spot.npc_ids.is_empty());
                assert_eq!(spot.spot.status(), GenerationStatus::Ready);
            }
        }
        assert_eq!(h.records.count(CallKind::Npc, false), 4);
    }

    #[tokio::test]
    async fn test_longer_lists_are_truncated_to_requested_count() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new().with_regions(5).with_spots(4)),
            Arc::new(StaticImageGenerator::default()),
        );
        let mut request = request(RegionSelection::All);
        request.npcs_per_spot = 0;

        // Act
        let tree = h
            .generator
            .generate_world(&request, &RecordingProgress::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(tree.regions.len(), 2);
        assert!(tree.regions.iter().all(|r| r.spots.len() == 2));
        assert_eq!(h.entities.count("region"), 2);
    }

    #[tokio::test]
    async fn test_image_failures_leave_entities_ready_without_images() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(FailingImageGenerator::default()),
        );
        let mut request = request(RegionSelection::All);
        request.region_count = 1;

        // Act
        let tree = h
            .generator
            .generate_world(&request, &RecordingProgress::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(tree.world.status(), GenerationStatus::Ready);
        assert!(tree.world.cover_image_url.is_none());
        let region = &tree.regions[0];
        assert_eq!(region.region.status(), RegionStatus::Ready);
        assert!(region.region.cover_image_url.is_none());
        assert!(region.spots.iter().all(|s| s.spot.image_url.is_none()));
        assert!(region.npcs().all(|n| n.portrait_url.is_none()));
        // world + region + 2 spots + 2 portraits
        assert_eq!(h.records.count(CallKind::Image, false), 6);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_any_call() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(StaticImageGenerator::default()),
        );
        let mut request = request(RegionSelection::All);
        request.theme = String::new();

        // Act
        let err = h
            .generator
            .generate_world(&request, &RecordingProgress::default())
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(
            err,
            OrchestrationError::Domain(DomainError::Validation(_))
        ));
        assert!(h.records.records().is_empty());
    }

    #[tokio::test]
    async fn test_region_details_for_unknown_world_is_not_found() {
        // Arrange
        let h = harness(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(StaticImageGenerator::default()),
        );
        let command = GenerateRegionDetails {
            world_id: Uuid::new_v4(),
            region_id: Uuid::new_v4(),
            spot_count: 2,
            npcs_per_spot: 1,
        };

        // Act
        let err = h
            .generator
            .generate_region_details(&command, &NoopProgress)
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(
            err,
            OrchestrationError::Domain(DomainError::NotFound { entity: "world", .. })
        ));
    }

    #[tokio::test]
    async fn test_persistence_failure_marks_world_error_after_cover_settles() {
        // Arrange
        let h = harness_with(
            Arc::new(CannedTextGenerator::new()),
            Arc::new(StaticImageGenerator::default()),
            MockEntityRepository::failing_spots(),
        );

        // Act
        let err = h
            .generator
            .generate_world(&request(RegionSelection::All), &RecordingProgress::default())
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(
            err,
            OrchestrationError::Domain(DomainError::Infrastructure(_))
        ));
        let saves = h.entities.saves.lock().unwrap().clone();
        let world_id = saves
            .iter()
            .find(|(entity, _, _)| *entity == "world")
            .map(|(_, id, _)| *id)
            .unwrap();
        assert_eq!(h.entities.history(world_id).last(), Some(&"error"));
        let failed_region = saves
            .iter()
            .find(|(entity, _, status)| *entity == "region" && *status == "error");
        assert!(failed_region.is_some());
        // The world cover was joined before the error was returned.
        let covers = h
            .records
            .records()
            .iter()
            .filter(|r| r.kind == CallKind::Image && r.correlation.region_id.is_none())
            .count();
        assert_eq!(covers, 1);
    }
}
