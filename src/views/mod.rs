//! Views: the map and the first-person AR overlay.
//!
//! DESIGN
//! ======
//! A view is inactive until `activate`, and renders nothing while inactive.
//! Views only read service state; the drawing itself goes through a surface
//! trait so the rendering layer stays outside this crate.
//!
//! Every view owns a [`RenderGate`]. A notification that arrives while a
//! render pass is running is not dropped: it marks a single pending slot and
//! the running pass loops once more when it finishes. Any number of
//! notifications during one pass collapse into that one extra pass.

pub mod ar;
pub mod log_surface;
pub mod map;
pub mod surface;

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::util::lock;

pub use ar::ArView;
pub use map::MapView;
pub use surface::{ArPlacement, ArSurface, MapSurface, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Map,
    Ar,
}

impl std::fmt::Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Map => "map",
            Self::Ar => "ar",
        })
    }
}

impl std::str::FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "map" => Ok(Self::Map),
            "ar" => Ok(Self::Ar),
            other => Err(format!("unknown view `{other}` (expected `map` or `ar`)")),
        }
    }
}

/// Activation state shared by both views.
#[async_trait::async_trait]
pub trait View: Send + Sync {
    fn kind(&self) -> ViewKind;

    /// Show, start view-exclusive sensors, then render once.
    async fn activate(&self);

    /// Hide and stop view-exclusive sensors.
    fn deactivate(&self);

    fn is_active(&self) -> bool;
}

// =============================================================================
// RENDER GATE
// =============================================================================

#[derive(Debug, Default)]
struct GateState {
    active: bool,
    rendering: bool,
    pending: bool,
}

#[derive(Debug, Default)]
pub struct RenderGate {
    state: Mutex<GateState>,
}

impl RenderGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` on the inactive to active transition.
    pub fn activate(&self) -> bool {
        let mut state = lock(&self.state);
        !std::mem::replace(&mut state.active, true)
    }

    /// Returns `true` on the active to inactive transition. Drops any pending pass.
    pub fn deactivate(&self) -> bool {
        let mut state = lock(&self.state);
        state.pending = false;
        std::mem::replace(&mut state.active, false)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    /// Claim the render slot. `false` if inactive, or if a pass is running
    /// (the request is then coalesced into one follow-up pass).
    pub fn begin(&self) -> bool {
        let mut state = lock(&self.state);
        if !state.active {
            return false;
        }
        if state.rendering {
            state.pending = true;
            return false;
        }
        state.rendering = true;
        true
    }

    /// Release the slot. Returns `true` if a coalesced request is waiting, in
    /// which case the slot stays claimed and the caller renders again.
    pub fn finish(&self) -> bool {
        let mut state = lock(&self.state);
        if state.pending && state.active {
            state.pending = false;
            return true;
        }
        state.pending = false;
        state.rendering = false;
        false
    }

    /// Run `pass` now, plus once more for every burst of requests that
    /// arrived while it ran. Returns the number of passes run.
    pub fn run(&self, mut pass: impl FnMut()) -> usize {
        if !self.begin() {
            return 0;
        }
        let mut passes = 0;
        loop {
            pass();
            passes += 1;
            if !self.finish() {
                return passes;
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
