//! Veripeditus game client runtime.
//!
//! Fuses device sensors into player state, mirrors nearby game objects from
//! the server, and projects them onto a map and a first-person AR overlay.
//!
//! | Module | Role |
//! |--------|------|
//! | [`sensor`] | geolocation, orientation and camera input |
//! | [`sync`] | server mirror, session and reconciliation |
//! | [`views`] | map and AR views driven by bus events |
//! | [`bus`] | typed event dispatch |
//! | [`app`] | wiring for a complete client |
//!
//! Geometry lives in the separate `projection` crate.

pub mod app;
pub mod bus;
pub mod config;
pub mod events;
pub mod model;
pub mod sensor;
pub mod sync;
pub mod throttle;
pub mod views;

mod util;
