//! Generation-status state machines.
//!
//! Every generable entity moves forward through a kind-specific status set.
//! `error` is reachable from any non-terminal status; `ready` and `error`
//! are terminal. Writes that would move backwards or leave a terminal status
//! are rejected and logged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// A forward-only status set.
pub trait StatusMachine: Copy + Eq + std::fmt::Debug {
    /// The failure status, reachable from every non-terminal status.
    const ERROR: Self;

    /// Position in the forward order.
    fn rank(self) -> u8;

    /// Whether no further transition is allowed.
    fn is_terminal(self) -> bool;

    /// Stable snake-case name.
    fn as_str(self) -> &'static str;

    /// Whether moving from `self` to `next` is a forward move.
    fn can_advance_to(self, next: Self) -> bool {
        !self.is_terminal() && (next == Self::ERROR || next.rank() > self.rank())
    }
}

/// Status of a world, spot, NPC, or vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Nothing generated yet.
    Pending,
    /// Description known; children still being generated.
    GeneratingText,
    /// Text settled; image call in flight.
    GeneratingImage,
    /// Fully generated. An image may still be absent if its call failed.
    Ready,
    /// The description could not be generated.
    Error,
}

impl StatusMachine for GenerationStatus {
    const ERROR: Self = Self::Error;

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::GeneratingText => 1,
            Self::GeneratingImage => 2,
            Self::Ready => 3,
            Self::Error => 4,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::GeneratingText => "generating_text",
            Self::GeneratingImage => "generating_image",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

/// Status of a region.
///
/// Regions settle twice: once as `outlined` after the region stage, and
/// again as `ready` once spot detail has been generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionStatus {
    /// Nothing generated yet.
    Pending,
    /// Description known.
    GeneratingText,
    /// Cover image in flight.
    GeneratingImage,
    /// Description and cover settled; no spot detail requested yet.
    Outlined,
    /// Spot list being generated.
    GeneratingSpots,
    /// Spots exist; NPCs and images being generated.
    GeneratingImages,
    /// Fully detailed.
    Ready,
    /// The region or its spot list could not be generated.
    Error,
}

impl StatusMachine for RegionStatus {
    const ERROR: Self = Self::Error;

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::GeneratingText => 1,
            Self::GeneratingImage => 2,
            Self::Outlined => 3,
            Self::GeneratingSpots => 4,
            Self::GeneratingImages => 5,
            Self::Ready => 6,
            Self::Error => 7,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::GeneratingText => "generating_text",
            Self::GeneratingImage => "generating_image",
            Self::Outlined => "outlined",
            Self::GeneratingSpots => "generating_spots",
            Self::GeneratingImages => "generating_images",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

/// Status, failure message, and timestamps shared by every generable entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle<S> {
    /// Current status.
    pub status: S,
    /// Why the entity entered `error`.
    pub error: Option<String>,
    /// When the entity was first built.
    pub created_at: DateTime<Utc>,
    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl<S: StatusMachine> Lifecycle<S> {
    /// A lifecycle starting in `status` at `now`.
    #[must_use]
    pub fn new(status: S, now: DateTime<Utc>) -> Self {
        Self {
            status,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn advance(&mut self, next: S, now: DateTime<Utc>, entity: &'static str, id: Uuid) -> bool {
        if !self.status.can_advance_to(next) {
            warn!(
                entity,
                entity_id = %id,
                from = self.status.as_str(),
                to = next.as_str(),
                "rejected status transition"
            );
            return false;
        }
        debug!(entity, entity_id = %id, from = self.status.as_str(), to = next.as_str(), "status changed");
        self.status = next;
        self.updated_at = now;
        true
    }
}

/// An entity carrying a [`Lifecycle`].
pub trait Generable {
    /// The entity's status set.
    type Status: StatusMachine;

    /// Entity kind name used in logs and errors.
    const ENTITY: &'static str;

    /// Entity identifier.
    fn id(&self) -> Uuid;

    /// Read access to the lifecycle.
    fn lifecycle(&self) -> &Lifecycle<Self::Status>;

    /// Write access to the lifecycle.
    fn lifecycle_mut(&mut self) -> &mut Lifecycle<Self::Status>;

    /// Current status.
    fn status(&self) -> Self::Status {
        self.lifecycle().status
    }

    /// Moves to `next` if that is a forward move. Returns whether it moved.
    fn advance(&mut self, next: Self::Status, now: DateTime<Utc>) -> bool {
        let id = self.id();
        self.lifecycle_mut().advance(next, now, Self::ENTITY, id)
    }

    /// Moves to `error` and keeps `message`. Returns whether it moved.
    fn fail(&mut self, message: impl Into<String>, now: DateTime<Utc>) -> bool {
        let id = self.id();
        let lifecycle = self.lifecycle_mut();
        if lifecycle.advance(<Self::Status as StatusMachine>::ERROR, now, Self::ENTITY, id) {
            lifecycle.error = Some(message.into());
            true
        } else {
            false
        }
    }
}
