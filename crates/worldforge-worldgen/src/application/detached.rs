//! Image calls that run alongside later stages.

use tokio::task::JoinHandle;
use tracing::warn;
use worldforge_generation::application::client::GenerationClient;
use worldforge_generation::domain::call::CallCorrelation;

/// A spawned image call whose URL may be collected later.
///
/// The call only produces a URL; applying it to an entity is left to
/// whoever joins the handle.
#[derive(Debug)]
pub struct DetachedImage {
    handle: JoinHandle<Option<String>>,
}

impl DetachedImage {
    /// Starts the image call on the runtime and returns at once.
    #[must_use]
    pub fn spawn(client: GenerationClient, prompt: String, correlation: CallCorrelation) -> Self {
        let handle = tokio::spawn(async move {
            client
                .image(prompt, correlation)
                .await
                .ok()
                .map(|image| image.url)
        });
        Self { handle }
    }

    /// Waits for the call. `None` when it failed or its task died.
    pub async fn join(self) -> Option<String> {
        match self.handle.await {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "detached image task did not complete");
                None
            }
        }
    }
}
