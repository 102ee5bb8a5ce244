//! Typed entry point for generation calls used by the orchestrator.

use std::sync::Arc;

use crate::application::executor::{AttemptOutput, CallDescriptor, CallExecutor};
use crate::application::settings::GenerationSettings;
use crate::domain::call::{
    CallCorrelation, CallKind, CallOutcome, GeneratedImage, ImageRequest, TextRequest,
};
use crate::domain::error::GenerationError;
use crate::domain::payload::TextPayload;
use crate::domain::ports::{ImageGenerator, TextGenerator};

/// Couples the text and image backends with the retrying executor and the
/// configured policies.
#[derive(Clone)]
pub struct GenerationClient {
    text: Arc<dyn TextGenerator>,
    image: Arc<dyn ImageGenerator>,
    executor: CallExecutor,
    settings: Arc<GenerationSettings>,
}

impl GenerationClient {
    /// Creates a client.
    #[must_use]
    pub fn new(
        text: Arc<dyn TextGenerator>,
        image: Arc<dyn ImageGenerator>,
        executor: CallExecutor,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            text,
            image,
            executor,
            settings: Arc::new(settings),
        }
    }

    /// The settings this client was built with.
    #[must_use]
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Requests a text payload of type `P`, parsing each attempt's completion.
    pub async fn text<P: TextPayload>(
        &self,
        prompt: String,
        correlation: CallCorrelation,
    ) -> CallOutcome<P> {
        let request = TextRequest {
            kind: P::KIND,
            prompt: prompt.clone(),
            system_prompt: self.settings.system_prompt.clone(),
            model: self.settings.text_model.clone(),
        };
        let descriptor = CallDescriptor {
            kind: P::KIND,
            prompt,
            correlation,
        };

        let backend = self.text.as_ref();
        let request = &request;
        self.executor
            .execute(descriptor, &self.settings.text_policy, move |_| async move {
                let completion = backend.generate_text(request).await?;
                let value = P::parse(&completion.content)?;
                Ok(AttemptOutput {
                    value,
                    response: completion.content,
                    model: Some(completion.model),
                    usage: Some(completion.usage),
                })
            })
            .await
    }

    /// Requests one image; an empty URL counts as a failed attempt.
    pub async fn image(
        &self,
        prompt: String,
        correlation: CallCorrelation,
    ) -> CallOutcome<GeneratedImage> {
        let request = ImageRequest {
            prompt: prompt.clone(),
            dimensions: self.settings.image_dimensions,
            style: self.settings.image_style.clone(),
        };
        let descriptor = CallDescriptor {
            kind: CallKind::Image,
            prompt,
            correlation,
        };

        let backend = self.image.as_ref();
        let request = &request;
        self.executor
            .execute(descriptor, &self.settings.image_policy, move |_| async move {
                let image = backend.generate_image(request).await?;
                if image.url.trim().is_empty() {
                    return Err(GenerationError::EmptyPayload);
                }
                Ok(AttemptOutput {
                    response: image.url.clone(),
                    model: image.model.clone(),
                    value: image,
                    usage: None,
                })
            })
            .await
    }
}
