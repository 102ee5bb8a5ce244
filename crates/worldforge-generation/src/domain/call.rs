//! Request, response, and outcome types for remote generation calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of remote call being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// A single world description.
    WorldDescription,
    /// A batch of region descriptions for one world.
    RegionList,
    /// A batch of spot descriptions for one region.
    SpotList,
    /// One NPC profile.
    Npc,
    /// Dialog lines for an existing NPC.
    Dialog,
    /// One vehicle description.
    Vehicle,
    /// Any image: covers, spot images, portraits.
    Image,
}

impl CallKind {
    /// Stable snake-case name, used in logs and call records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WorldDescription => "world_description",
            Self::RegionList => "region_list",
            Self::SpotList => "spot_list",
            Self::Npc => "npc",
            Self::Dialog => "dialog",
            Self::Vehicle => "vehicle",
            Self::Image => "image",
        }
    }

    /// Whether this is a text call (as opposed to an image call).
    #[must_use]
    pub fn is_text(self) -> bool {
        !matches!(self, Self::Image)
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers tying a call to the entity it generates content for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCorrelation {
    /// The world being generated.
    pub world_id: Option<Uuid>,
    /// The region, if the call is region-scoped or below.
    pub region_id: Option<Uuid>,
    /// The spot, if the call is spot-scoped or below.
    pub spot_id: Option<Uuid>,
    /// The NPC, for NPC portraits and dialog.
    pub npc_id: Option<Uuid>,
    /// The vehicle, for vehicle descriptions and images.
    pub vehicle_id: Option<Uuid>,
}

impl CallCorrelation {
    /// Correlation for a world-scoped call.
    #[must_use]
    pub fn world(world_id: Uuid) -> Self {
        Self {
            world_id: Some(world_id),
            ..Self::default()
        }
    }

    /// Narrows the correlation to a region.
    #[must_use]
    pub fn with_region(mut self, region_id: Uuid) -> Self {
        self.region_id = Some(region_id);
        self
    }

    /// Narrows the correlation to a spot.
    #[must_use]
    pub fn with_spot(mut self, spot_id: Uuid) -> Self {
        self.spot_id = Some(spot_id);
        self
    }

    /// Narrows the correlation to an NPC.
    #[must_use]
    pub fn with_npc(mut self, npc_id: Uuid) -> Self {
        self.npc_id = Some(npc_id);
        self
    }

    /// Narrows the correlation to a vehicle.
    #[must_use]
    pub fn with_vehicle(mut self, vehicle_id: Uuid) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }
}

/// Token usage reported by a text backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens billed.
    pub total_tokens: u32,
}

/// Model parameters for text calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on completion tokens.
    pub max_tokens: u32,
}

/// A text generation request.
#[derive(Debug, Clone)]
pub struct TextRequest {
    /// The kind of text being requested.
    pub kind: CallKind,
    /// User prompt.
    pub prompt: String,
    /// System prompt.
    pub system_prompt: String,
    /// Model parameters.
    pub model: ModelConfig,
}

/// A raw text completion from the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCompletion {
    /// The completion content.
    pub content: String,
    /// Model that produced the completion.
    pub model: String,
    /// Token usage.
    pub usage: TokenUsage,
}

/// Pixel dimensions for a generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An image generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Image prompt.
    pub prompt: String,
    /// Output dimensions.
    pub dimensions: ImageDimensions,
    /// Optional style hint appended by the backend adapter.
    pub style: Option<String>,
}

/// A generated image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Where the image can be fetched.
    pub url: String,
    /// Model that produced the image, if reported.
    pub model: Option<String>,
}

/// A successful logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSuccess<T> {
    /// The parsed output.
    pub value: T,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
    /// Token usage of the successful attempt, for text calls.
    pub usage: Option<TokenUsage>,
}

/// A logical call that exhausted its attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFailure {
    /// Message of the last attempt's error.
    pub error: String,
    /// Attempts consumed.
    pub attempts: u32,
}

/// Terminal outcome of a logical call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    /// The call produced a value.
    Success(CallSuccess<T>),
    /// Every attempt failed.
    Failure(CallFailure),
}

impl<T> CallOutcome<T> {
    /// Attempts consumed by the call.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success(success) => success.attempts,
            Self::Failure(failure) => failure.attempts,
        }
    }

    /// Retries made beyond the first attempt.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.attempts().saturating_sub(1)
    }

    /// Whether the call succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into a `Result`, keeping the success metadata.
    ///
    /// # Errors
    ///
    /// Returns the `CallFailure` if every attempt failed.
    pub fn into_result(self) -> Result<CallSuccess<T>, CallFailure> {
        match self {
            Self::Success(success) => Ok(success),
            Self::Failure(failure) => Err(failure),
        }
    }

    /// Drops the metadata and keeps only the value, if any.
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Success(success) => Some(success.value),
            Self::Failure(_) => None,
        }
    }
}
