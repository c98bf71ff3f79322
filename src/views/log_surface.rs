//! Surfaces that trace what they would draw. Used by the headless binary.

use projection::geo::LatLon;
use tracing::{debug, info};

use super::{ArPlacement, ArSurface, MapSurface, Size};
use crate::bus::Handler;
use crate::events::UserNotice;
use crate::model::ObjectId;
use crate::sensor::CameraStream;

/// Size reported for every AR element.
const ELEMENT_SIZE: Size = Size { width: 64.0, height: 64.0 };

#[derive(Debug, Default)]
pub struct LogMapSurface;

impl MapSurface for LogMapSurface {
    fn set_visible(&self, visible: bool) {
        debug!(visible, "map visibility");
    }

    fn center_on(&self, at: LatLon) {
        info!(latitude = at.latitude, longitude = at.longitude, "map centered");
    }

    fn add_marker(&self, id: ObjectId, icon_url: &str, at: LatLon, label: &str) {
        info!(id, icon_url, label, latitude = at.latitude, longitude = at.longitude, "marker added");
    }

    fn move_marker(&self, id: ObjectId, at: LatLon) {
        debug!(id, latitude = at.latitude, longitude = at.longitude, "marker moved");
    }

    fn remove_marker(&self, id: ObjectId) {
        info!(id, "marker removed");
    }

    fn show_message(&self, text: &str) {
        info!(text, "map message");
    }
}

#[derive(Debug, Default)]
pub struct LogArSurface;

impl ArSurface for LogArSurface {
    fn set_visible(&self, visible: bool) {
        debug!(visible, "ar visibility");
    }

    fn attach_stream(&self, stream: Option<&CameraStream>) {
        match stream {
            Some(stream) => info!(stream = %stream.id, "camera attached"),
            None => info!("camera detached"),
        }
    }

    fn measure(&self, id: ObjectId, image_url: &str) -> Size {
        debug!(id, image_url, "element measured");
        ELEMENT_SIZE
    }

    fn place(&self, id: ObjectId, placement: &ArPlacement) {
        info!(id, z_index = placement.transform.z_index, transform = %placement.css(), "element placed");
    }

    fn conceal(&self, id: ObjectId) {
        debug!(id, "element concealed");
    }

    fn remove(&self, id: ObjectId) {
        debug!(id, "element removed");
    }

    fn show_message(&self, text: &str) {
        info!(text, "ar message");
    }
}

/// Writes player-facing notices to the log.
#[derive(Debug, Default)]
pub struct NoticeLog;

impl Handler<UserNotice> for NoticeLog {
    fn handle(&self, event: &UserNotice) {
        tracing::warn!(source = ?event.source, "{}", event.message);
    }
}
