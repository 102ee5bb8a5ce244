//! Test text generators: scripted `TextGenerator` implementations.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::json;
use worldforge_generation::domain::call::{CallKind, TextCompletion, TextRequest, TokenUsage};
use worldforge_generation::domain::error::GenerationError;
use worldforge_generation::domain::ports::TextGenerator;

const CANNED_MODEL: &str = "canned-model";

fn canned_failure() -> GenerationError {
    GenerationError::Transport {
        status: 503,
        body: "canned failure".into(),
    }
}

/// A text generator that answers every kind with valid JSON.
///
/// List sizes are configurable and independent of the requested count, so
/// tests can exercise truncation. Failures can be scripted per kind, and
/// optionally only for prompts containing a marker.
///
/// Generated names are numbered: regions `Region 1..`, spots `Spot 1..`,
/// NPCs `Npc 1..` (NPC numbering runs across the whole generator).
#[derive(Debug)]
pub struct CannedTextGenerator {
    regions: usize,
    spots: usize,
    failures: Vec<(CallKind, Option<String>)>,
    npc_counter: AtomicU32,
    requests: Mutex<Vec<(CallKind, String)>>,
}

impl Default for CannedTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CannedTextGenerator {
    /// A generator returning 2 regions and 2 spots per list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: 2,
            spots: 2,
            failures: Vec::new(),
            npc_counter: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sets how many regions every region list contains.
    #[must_use]
    pub fn with_regions(mut self, regions: usize) -> Self {
        self.regions = regions;
        self
    }

    /// Sets how many spots every spot list contains.
    #[must_use]
    pub fn with_spots(mut self, spots: usize) -> Self {
        self.spots = spots;
        self
    }

    /// Makes every call of `kind` fail.
    #[must_use]
    pub fn failing(mut self, kind: CallKind) -> Self {
        self.failures.push((kind, None));
        self
    }

    /// Makes calls of `kind` fail when the prompt contains `marker`.
    #[must_use]
    pub fn failing_when(mut self, kind: CallKind, marker: impl Into<String>) -> Self {
        self.failures.push((kind, Some(marker.into())));
        self
    }

    /// Returns `(kind, prompt)` for every request received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<(CallKind, String)> {
        self.requests.lock().unwrap().clone()
    }

    fn should_fail(&self, request: &TextRequest) -> bool {
        self.failures.iter().any(|(kind, marker)| {
            *kind == request.kind
                && marker
                    .as_deref()
                    .is_none_or(|marker| request.prompt.contains(marker))
        })
    }

    fn body(&self, kind: CallKind) -> serde_json::Value {
        match kind {
            CallKind::WorldDescription => json!({
                "name": "Canned World",
                "description": "A world assembled from canned replies.",
                "tone": "wry",
            }),
            CallKind::RegionList => json!({
                "regions": (1..=self.regions)
                    .map(|n| json!({
                        "name": format!("Region {n}"),
                        "description": format!("Canned region number {n}."),
                        "climate": "temperate",
                    }))
                    .collect::<Vec<_>>(),
            }),
            CallKind::SpotList => json!({
                "spots": (1..=self.spots)
                    .map(|n| json!({
                        "name": format!("Spot {n}"),
                        "description": "A canned place to visit.",
                        "kind": "landmark",
                    }))
                    .collect::<Vec<_>>(),
            }),
            CallKind::Npc => {
                let n = self.npc_counter.fetch_add(1, Ordering::SeqCst) + 1;
                json!({
                    "name": format!("Npc {n}"),
                    "role": "local",
                    "personality": "patient",
                    "appearance": "weathered coat",
                    "greeting": "Well met.",
                })
            }
            CallKind::Dialog => json!({
                "lines": ["Well met.", "Mind the tide."],
            }),
            CallKind::Vehicle => json!({
                "name": "Canned Barge",
                "description": "A flat-bottomed barge.",
                "capacity": 6,
            }),
            CallKind::Image => json!({}),
        }
    }
}

#[async_trait]
impl TextGenerator for CannedTextGenerator {
    async fn generate_text(&self, request: &TextRequest) -> Result<TextCompletion, GenerationError> {
        self.requests
            .lock()
            .unwrap()
            .push((request.kind, request.prompt.clone()));
        if self.should_fail(request) {
            return Err(canned_failure());
        }
        Ok(TextCompletion {
            content: self.body(request.kind).to_string(),
            model: CANNED_MODEL.to_owned(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
        })
    }
}

/// A text generator that always fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingTextGenerator {
    calls: AtomicU32,
}

impl FailingTextGenerator {
    /// Number of attempts received.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FailingTextGenerator {
    async fn generate_text(&self, _request: &TextRequest) -> Result<TextCompletion, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(canned_failure())
    }
}

/// A text generator that fails its first `failures` attempts and then
/// delegates to a [`CannedTextGenerator`].
#[derive(Debug)]
pub struct FlakyTextGenerator {
    failures: u32,
    calls: AtomicU32,
    inner: CannedTextGenerator,
}

impl FlakyTextGenerator {
    /// Fails the first `failures` attempts, then answers like `inner`.
    #[must_use]
    pub fn new(failures: u32, inner: CannedTextGenerator) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            inner,
        }
    }

    /// Number of attempts received.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FlakyTextGenerator {
    async fn generate_text(&self, request: &TextRequest) -> Result<TextCompletion, GenerationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(GenerationError::Request("connection reset".into()));
        }
        self.inner.generate_text(request).await
    }
}

#[cfg(test)]
mod tests {
    use worldforge_generation::domain::call::ModelConfig;
    use worldforge_generation::domain::payload::{RegionList, SpotList, TextPayload};

    use super::*;

    fn request(kind: CallKind, prompt: &str) -> TextRequest {
        TextRequest {
            kind,
            prompt: prompt.to_owned(),
            system_prompt: String::new(),
            model: ModelConfig {
                model: "m".to_owned(),
                temperature: 0.0,
                max_tokens: 1,
            },
        }
    }

    #[tokio::test]
    async fn test_canned_lists_parse_with_configured_sizes() {
        // Arrange
        let generator = CannedTextGenerator::new().with_regions(3).with_spots(1);

        // Act
        let regions = generator
            .generate_text(&request(CallKind::RegionList, "regions"))
            .await
            .unwrap();
        let spots = generator
            .generate_text(&request(CallKind::SpotList, "spots"))
            .await
            .unwrap();

        // Assert
        assert_eq!(RegionList::parse(&regions.content).unwrap().regions.len(), 3);
        assert_eq!(SpotList::parse(&spots.content).unwrap().spots.len(), 1);
        assert_eq!(generator.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_when_matches_marker_only() {
        // Arrange
        let generator = CannedTextGenerator::new().failing_when(CallKind::SpotList, "Region 2");

        // Act
        let first = generator
            .generate_text(&request(CallKind::SpotList, "spots for Region 1"))
            .await;
        let second = generator
            .generate_text(&request(CallKind::SpotList, "spots for Region 2"))
            .await;

        // Assert
        assert!(first.is_ok());
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_flaky_generator_recovers_after_failures() {
        // Arrange
        let generator = FlakyTextGenerator::new(2, CannedTextGenerator::new());
        let req = request(CallKind::Vehicle, "a boat");

        // Act
        let first = generator.generate_text(&req).await;
        let second = generator.generate_text(&req).await;
        let third = generator.generate_text(&req).await;

        // Assert
        assert!(first.is_err());
        assert!(second.is_err());
        assert!(third.is_ok());
        assert_eq!(generator.calls(), 3);
    }
}
