//! Client-side data model.
//!
//! DESIGN
//! ======
//! `Position` and `Orientation` are written only by the sensor service;
//! `ObjectSnapshot` only by the sync service. Everyone else reads copies.
//! Snapshots are immutable once published and shared behind `Arc`.

use std::collections::BTreeMap;

use projection::geo::LatLon;
use serde::{Deserialize, Serialize};

/// Server-assigned game object identity.
pub type ObjectId = i64;

// =============================================================================
// DEVICE STATE
// =============================================================================

/// Last accepted geolocation fix. All zero until the first sample arrives.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy: f64,
    /// Milliseconds since the Unix epoch, as reported by the platform.
    pub timestamp: u64,
}

impl Position {
    #[must_use]
    pub fn point(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    /// Whether a real fix has been recorded.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.timestamp != 0 || self.latitude != 0.0 || self.longitude != 0.0
    }
}

/// Fused device orientation. `heading` is a compass bearing in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub heading: f64,
    pub absolute: bool,
}

// =============================================================================
// GAME OBJECTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub isonmap: bool,
    pub image: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    /// Everything else the server sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Relationships {
    pub world: Option<ObjectId>,
    pub inventory: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    pub latitude: f64,
    pub longitude: f64,
    pub attributes: Attributes,
    pub relationships: Relationships,
}

impl GameObject {
    #[must_use]
    pub fn point(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.attributes.name.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub id: ObjectId,
    pub name: String,
}

/// Remote actions a player can trigger on a game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameAction {
    Collect,
    Place,
    Talk,
}

impl GameAction {
    /// Path segment of the action endpoint.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Collect => "collect",
            Self::Place => "place",
            Self::Talk => "talk",
        }
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Canonical object store as published by one completed reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSnapshot {
    /// Cycle that produced this snapshot; 0 for the empty initial store.
    pub generation: u64,
    pub objects: BTreeMap<ObjectId, GameObject>,
}

impl ObjectSnapshot {
    #[must_use]
    pub fn new(generation: u64, objects: BTreeMap<ObjectId, GameObject>) -> Self {
        Self { generation, objects }
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
