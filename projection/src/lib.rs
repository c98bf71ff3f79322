//! Geometry for projecting geo-referenced game objects into renderable space.
//!
//! Everything here is pure: no I/O, no clocks, no owned state. The client
//! runtime feeds it the player's fix and heading plus the synced object set,
//! and hands the results to whichever rendering layer is active.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geo`] | Coordinates, bounding boxes, bearing and great-circle distance |
//! | [`ar`] | First-person overlay visibility test and perspective transform |
//! | [`markers`] | Map marker keep/create/remove diffing |
//! | [`consts`] | Shared numeric constants |

pub mod ar;
pub mod consts;
pub mod geo;
pub mod markers;
