//! Test image generators: mock `ImageGenerator` implementations.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use worldforge_generation::domain::call::{GeneratedImage, ImageRequest};
use worldforge_generation::domain::error::GenerationError;
use worldforge_generation::domain::ports::ImageGenerator;

fn numbered_image(counter: &AtomicU32) -> GeneratedImage {
    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
    GeneratedImage {
        url: format!("https://images.test/{n}.png"),
        model: Some("static-image".to_owned()),
    }
}

/// An image generator that always succeeds with a fresh numbered URL.
#[derive(Debug, Default)]
pub struct StaticImageGenerator {
    calls: AtomicU32,
}

impl StaticImageGenerator {
    /// Number of attempts received.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for StaticImageGenerator {
    async fn generate_image(
        &self,
        _request: &ImageRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        Ok(numbered_image(&self.calls))
    }
}

/// An image generator that always fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingImageGenerator {
    calls: AtomicU32,
}

impl FailingImageGenerator {
    /// Number of attempts received.
    #[must_use]
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FailingImageGenerator {
    async fn generate_image(
        &self,
        _request: &ImageRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Transport {
            status: 500,
            body: "image backend down".into(),
        })
    }
}

/// An image generator that fails prompts containing `marker` and succeeds
/// for everything else.
#[derive(Debug)]
pub struct SelectiveImageGenerator {
    marker: String,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl SelectiveImageGenerator {
    /// Fails every prompt containing `marker`.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt received, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for SelectiveImageGenerator {
    async fn generate_image(
        &self,
        request: &ImageRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if request.prompt.contains(&self.marker) {
            return Err(GenerationError::EmptyPayload);
        }
        Ok(numbered_image(&self.calls))
    }
}
