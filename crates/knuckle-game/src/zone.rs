//! The zone capability: a named region of the map and who is inside it.
//!
//! A [`Session`](crate::Session) owns one `Zone` and delegates occupant
//! bookkeeping to it. How avatars enter and leave the region is the host's
//! business; the zone only records the result.

use knuckle_protocol::{ParticipantId, SessionId};
use serde::{Deserialize, Serialize};

use crate::ZoneError;

/// An axis-aligned rectangle in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A zone as it appears on the town map, before validation.
///
/// Width and height are optional because map editors emit point objects
/// without them; such objects are rejected by [`Zone::from_descriptor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDescriptor {
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// A named region and its occupants, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    id: SessionId,
    bounds: BoundingBox,
    occupants: Vec<ParticipantId>,
}

impl Zone {
    /// Creates an empty zone.
    pub fn new(id: SessionId, bounds: BoundingBox) -> Self {
        Self {
            id,
            bounds,
            occupants: Vec::new(),
        }
    }

    /// Validates a map descriptor and builds an empty zone from it.
    ///
    /// # Errors
    /// [`ZoneError::MalformedZone`] if the name is blank or the width or
    /// height is missing, zero, negative, or not finite.
    pub fn from_descriptor(descriptor: &ZoneDescriptor) -> Result<Self, ZoneError> {
        let malformed = |reason: &str| ZoneError::MalformedZone {
            name: descriptor.name.clone(),
            reason: reason.to_string(),
        };

        if descriptor.name.trim().is_empty() {
            return Err(malformed("zone has no name"));
        }
        let width = descriptor
            .width
            .filter(|w| w.is_finite() && *w > 0.0)
            .ok_or_else(|| malformed("missing or non-positive width"))?;
        let height = descriptor
            .height
            .filter(|h| h.is_finite() && *h > 0.0)
            .ok_or_else(|| malformed("missing or non-positive height"))?;

        Ok(Self::new(
            SessionId::new(descriptor.name.clone()),
            BoundingBox {
                x: descriptor.x,
                y: descriptor.y,
                width,
                height,
            },
        ))
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Records an arrival. Returns `false` if already inside.
    pub fn add(&mut self, participant: ParticipantId) -> bool {
        if self.contains(&participant) {
            return false;
        }
        self.occupants.push(participant);
        true
    }

    /// Records a departure. Returns `false` if not inside.
    pub fn remove(&mut self, participant: &ParticipantId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|p| p != participant);
        self.occupants.len() != before
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.occupants.contains(participant)
    }

    pub fn occupants(&self) -> &[ParticipantId] {
        &self.occupants
    }

    /// A zone is active while anyone is inside it.
    pub fn is_active(&self) -> bool {
        !self.occupants.is_empty()
    }
}
