//! Shared application state.

use std::sync::Arc;

use worldforge_tasks::application::queue::TaskQueue;
use worldforge_worldgen::application::orchestrator::WorldGenerator;
use worldforge_worldgen::domain::ports::EntityRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Background job queue.
    pub queue: TaskQueue,
    /// Generation orchestrator handed to submitted jobs.
    pub generator: WorldGenerator,
    /// Read access to generated worlds.
    pub entities: Arc<dyn EntityRepository>,
    /// Terminal tasks kept on cleanup.
    pub task_retention: usize,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        queue: TaskQueue,
        generator: WorldGenerator,
        entities: Arc<dyn EntityRepository>,
        task_retention: usize,
    ) -> Self {
        Self {
            queue,
            generator,
            entities,
            task_retention,
        }
    }
}
