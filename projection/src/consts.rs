//! Shared numeric constants for the projection crate.

// ── Geodesy ─────────────────────────────────────────────────────

/// Mean Earth radius in meters, as used by common web map libraries.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Full turn in degrees.
pub const FULL_TURN_DEG: f64 = 360.0;

/// Half turn in degrees.
pub const HALF_TURN_DEG: f64 = 180.0;

// ── AR overlay ──────────────────────────────────────────────────

/// Objects whose bearing differs from the heading by this much or more are
/// behind the viewer.
pub const AR_FIELD_HALF_ANGLE_DEG: f64 = 90.0;

/// Stacking multiplier: each meter closer raises the z-index by this much.
pub const AR_Z_INDEX_SCALE: f64 = 100.0;
