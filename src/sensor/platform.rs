//! Platform seam for raw device sensors.
//!
//! A platform hands out sample feeds as channels. Dropping the receiver is
//! how a listener is detached, so the service never needs a separate
//! unregister call for geolocation or orientation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::Viewport;
use crate::model::Position;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("geolocation permission denied")]
    PermissionDenied,
    #[error("geolocation position unavailable")]
    PositionUnavailable,
    #[error("geolocation timed out")]
    Timeout,
    #[error("geolocation failed: {0}")]
    Unknown(String),
}

impl GeolocationError {
    /// Message shown to the player.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location access was denied. Allow location access to play.",
            Self::PositionUnavailable => "Your location could not be determined.",
            Self::Timeout => "Locating your device took too long.",
            Self::Unknown(_) => "An unknown error occurred while locating your device.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera not supported on this device")]
    Unsupported,
    #[error("camera access denied")]
    Denied,
    #[error("camera failed: {0}")]
    Failed(String),
}

impl CameraError {
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unsupported => "This device has no usable camera.",
            Self::Denied => "Camera access was denied.",
            Self::Failed(_) => "The camera could not be started.",
        }
    }
}

// =============================================================================
// SAMPLES
// =============================================================================

/// Raw device-orientation reading, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationSample {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    /// Compass heading when the platform provides one natively.
    pub heading: Option<f64>,
    pub absolute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Rear camera.
    Environment,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: Facing,
    pub width: u32,
    pub height: u32,
}

impl CameraConstraints {
    /// Rear-facing stream sized to the viewport.
    #[must_use]
    pub fn rear(viewport: Viewport) -> Self {
        Self { facing: Facing::Environment, width: viewport.width, height: viewport.height }
    }
}

/// Opaque handle to a live media stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraStream {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

pub type PositionFeed = mpsc::Receiver<Result<Position, GeolocationError>>;
pub type OrientationFeed = mpsc::Receiver<OrientationSample>;

// =============================================================================
// PLATFORM TRAIT
// =============================================================================

#[async_trait::async_trait]
pub trait SensorPlatform: Send + Sync {
    /// Open a continuous geolocation watch.
    ///
    /// # Errors
    ///
    /// Returns a [`GeolocationError`] when the watch cannot be opened at all.
    fn watch_position(&self) -> Result<PositionFeed, GeolocationError>;

    /// Open a device-orientation listener, or `None` if unsupported.
    fn watch_orientation(&self) -> Option<OrientationFeed>;

    /// Acquire a camera stream.
    ///
    /// # Errors
    ///
    /// Returns a [`CameraError`] if the device refuses or has no camera.
    async fn request_camera(&self, constraints: CameraConstraints) -> Result<CameraStream, CameraError>;

    /// Stop every track of `stream`.
    fn release_camera(&self, stream: &CameraStream);
}
