//! Typed payloads parsed from text completions, one per call kind.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::call::CallKind;
use super::error::GenerationError;

/// A structured payload carried by a text completion.
///
/// Implementors are parsed from the JSON object in the completion; parsing is
/// part of the attempt, so a malformed or empty payload is retried.
pub trait TextPayload: DeserializeOwned + Send + Sized + 'static {
    /// The call kind that produces this payload.
    const KIND: CallKind;

    /// Rejects payloads that parsed but carry no usable content.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::EmptyPayload` when required content is missing.
    fn validate(&self) -> Result<(), GenerationError>;

    /// Parses and validates a completion.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPayload` for blank or content-free completions and
    /// `MalformedResponse` when no JSON object of the expected shape is found.
    fn parse(raw: &str) -> Result<Self, GenerationError> {
        let json = extract_json_object(raw)?;
        let payload: Self = serde_json::from_str(json)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }
}

/// Returns the outermost `{...}` slice of `raw`, tolerating code fences and
/// surrounding prose.
///
/// # Errors
///
/// Returns `EmptyPayload` for blank input and `MalformedResponse` when no
/// braces are present.
pub fn extract_json_object(raw: &str) -> Result<&str, GenerationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyPayload);
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&trimmed[start..=end]),
        _ => Err(GenerationError::MalformedResponse(
            "no JSON object in completion".into(),
        )),
    }
}

fn require(field: &str) -> Result<(), GenerationError> {
    if field.trim().is_empty() {
        Err(GenerationError::EmptyPayload)
    } else {
        Ok(())
    }
}

/// A generated world description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldDescription {
    /// World name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Overall tone, e.g. "grim" or "whimsical".
    #[serde(default)]
    pub tone: String,
}

impl TextPayload for WorldDescription {
    const KIND: CallKind = CallKind::WorldDescription;

    fn validate(&self) -> Result<(), GenerationError> {
        require(&self.name)?;
        require(&self.description)
    }
}

/// One region in a region list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDraft {
    /// Region name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Climate or biome.
    #[serde(default)]
    pub climate: String,
}

/// A batch of region descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionList {
    /// Regions in the order the backend returned them.
    pub regions: Vec<RegionDraft>,
}

impl TextPayload for RegionList {
    const KIND: CallKind = CallKind::RegionList;

    fn validate(&self) -> Result<(), GenerationError> {
        if self.regions.is_empty() {
            return Err(GenerationError::EmptyPayload);
        }
        self.regions.iter().try_for_each(|r| require(&r.name))
    }
}

/// One spot in a spot list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotDraft {
    /// Spot name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Kind of place, e.g. "tavern" or "ruin".
    #[serde(default)]
    pub kind: String,
}

/// A batch of spot descriptions; order is the tour route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotList {
    /// Spots in tour order.
    pub spots: Vec<SpotDraft>,
}

impl TextPayload for SpotList {
    const KIND: CallKind = CallKind::SpotList;

    fn validate(&self) -> Result<(), GenerationError> {
        if self.spots.is_empty() {
            return Err(GenerationError::EmptyPayload);
        }
        self.spots.iter().try_for_each(|s| require(&s.name))
    }
}

/// A generated NPC profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcProfile {
    /// NPC name.
    pub name: String,
    /// Role at the spot, e.g. "innkeeper".
    #[serde(default)]
    pub role: String,
    /// Personality sketch.
    #[serde(default)]
    pub personality: String,
    /// Physical appearance, used for the portrait prompt.
    #[serde(default)]
    pub appearance: String,
    /// Opening line.
    #[serde(default)]
    pub greeting: String,
}

impl TextPayload for NpcProfile {
    const KIND: CallKind = CallKind::Npc;

    fn validate(&self) -> Result<(), GenerationError> {
        require(&self.name)
    }
}

/// Dialog lines for an NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogScript {
    /// Lines in speaking order.
    pub lines: Vec<String>,
}

impl TextPayload for DialogScript {
    const KIND: CallKind = CallKind::Dialog;

    fn validate(&self) -> Result<(), GenerationError> {
        if self.lines.iter().all(|line| line.trim().is_empty()) {
            return Err(GenerationError::EmptyPayload);
        }
        Ok(())
    }
}

/// A generated vehicle description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDescription {
    /// Vehicle name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Passenger capacity.
    #[serde(default)]
    pub capacity: u32,
}

impl TextPayload for VehicleDescription {
    const KIND: CallKind = CallKind::Vehicle;

    fn validate(&self) -> Result<(), GenerationError> {
        require(&self.name)?;
        require(&self.description)
    }
}
