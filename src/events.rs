//! Event payloads carried by the [`EventBus`](crate::bus::EventBus).

use std::sync::Arc;

use crate::model::{GameAction, ObjectId, ObjectSnapshot, Orientation, Position};
use crate::sensor::CameraStream;
use crate::views::ViewKind;

/// A throttled geolocation sample was accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeolocationChanged {
    pub position: Position,
}

/// A throttled orientation sample was fused into a new heading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationChanged {
    pub orientation: Orientation,
}

/// The camera stream was attached (`Some`) or released (`None`).
#[derive(Debug, Clone, PartialEq)]
pub struct CameraChanged {
    pub stream: Option<CameraStream>,
}

/// The canonical object store was replaced.
#[derive(Debug, Clone)]
pub struct GameObjectsUpdated {
    pub snapshot: Arc<ObjectSnapshot>,
}

/// A remote object action succeeded. `origin` names the view that asked.
#[derive(Debug, Clone, PartialEq)]
pub struct GameObjectActionDone {
    pub origin: Option<ViewKind>,
    pub action: GameAction,
    pub object_id: ObjectId,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSource {
    Geolocation,
    Camera,
    Session,
}

/// Something the player should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotice {
    pub source: NoticeSource,
    pub message: String,
}

/// The logged-in player changed. `None` means logged out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionChanged {
    pub player_id: Option<ObjectId>,
}
