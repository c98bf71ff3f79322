//! Rendering-layer seams. Implementations draw; views decide what to draw.

use projection::ar::ArTransform;
use projection::geo::LatLon;

use crate::model::ObjectId;
use crate::sensor::CameraStream;

/// Measured on-screen size of an AR element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Where and how to draw one object in the AR overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ArPlacement {
    pub transform: ArTransform,
    pub size: Size,
    pub image_url: String,
}

impl ArPlacement {
    /// CSS transform for the compositing layer.
    #[must_use]
    pub fn css(&self) -> String {
        self.transform.css()
    }
}

pub trait MapSurface: Send + Sync {
    fn set_visible(&self, visible: bool);
    fn center_on(&self, at: LatLon);
    fn add_marker(&self, id: ObjectId, icon_url: &str, at: LatLon, label: &str);
    fn move_marker(&self, id: ObjectId, at: LatLon);
    fn remove_marker(&self, id: ObjectId);
    fn show_message(&self, text: &str);
}

pub trait ArSurface: Send + Sync {
    fn set_visible(&self, visible: bool);
    /// Show `stream` behind the overlay, or clear it.
    fn attach_stream(&self, stream: Option<&CameraStream>);
    /// Lay out the element for `id` and report its size.
    fn measure(&self, id: ObjectId, image_url: &str) -> Size;
    fn place(&self, id: ObjectId, placement: &ArPlacement);
    /// Hide without forgetting.
    fn conceal(&self, id: ObjectId);
    fn remove(&self, id: ObjectId);
    fn show_message(&self, text: &str);
}
