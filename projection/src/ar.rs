//! First-person overlay projection.
//!
//! An object is placed on a virtual cylinder around the viewer: its angle off
//! the device heading picks the horizontal offset, and its distance scales the
//! depth. Objects behind the viewer or beyond the draw distance are hidden by
//! the caller rather than transformed.

#[cfg(test)]
#[path = "ar_test.rs"]
mod ar_test;

use serde::{Deserialize, Serialize};

use crate::consts::{AR_FIELD_HALF_ANGLE_DEG, AR_Z_INDEX_SCALE};
use crate::geo::{LatLon, bearing_and_distance, normalize_bearing_diff};

/// Overlay tuning shared by every object in a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArParams {
    /// Draw distance in meters. Objects further away are hidden.
    pub max_distance: f64,
    /// Perspective depth in pixels.
    pub perspective: f64,
}

/// Placement of one object in the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArTransform {
    pub rotation_deg: f64,
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub z_index: i64,
}

impl ArTransform {
    /// CSS 3D transform for the compositing layer. CSS z points toward the
    /// viewer, so depth is negated.
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "translate3d({:.3}px, {:.3}px, {:.3}px) rotateY({:.3}deg)",
            self.tx, self.ty, -self.tz, self.rotation_deg
        )
    }
}

/// Visible iff strictly inside the forward half-plane and within draw distance.
#[must_use]
pub fn ar_visibility(bearing_diff: f64, distance: f64, max_distance: f64) -> bool {
    bearing_diff > -AR_FIELD_HALF_ANGLE_DEG && bearing_diff < AR_FIELD_HALF_ANGLE_DEG && distance <= max_distance
}

/// Perspective transform for an object `bearing_diff` degrees off the heading
/// and `distance` meters away. Does not check visibility.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn ar_transform(bearing_diff: f64, distance: f64, max_distance: f64, perspective: f64) -> ArTransform {
    let angle = bearing_diff.to_radians();
    ArTransform {
        rotation_deg: -bearing_diff,
        tx: angle.sin() * perspective,
        ty: 0.0,
        tz: angle.cos() * perspective * (distance / max_distance),
        z_index: ((max_distance - distance) * AR_Z_INDEX_SCALE + 1.0).round() as i64,
    }
}

/// Full projection of `target` as seen from `viewer` facing `heading`.
/// Returns `None` when the object must be hidden.
#[must_use]
pub fn project(viewer: LatLon, heading: f64, target: LatLon, params: ArParams) -> Option<ArTransform> {
    let (bearing, distance) = bearing_and_distance(viewer, target);
    let diff = normalize_bearing_diff(bearing, heading);
    if !ar_visibility(diff, distance, params.max_distance) {
        return None;
    }
    Some(ar_transform(diff, distance, params.max_distance, params.perspective))
}
