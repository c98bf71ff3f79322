//! AR view: objects projected into a first-person overlay over the camera.
//!
//! Each object's element is measured once, the first time it is seen; later
//! passes reuse the cached size. Objects outside the field of view or beyond
//! the maximum distance are concealed, not removed, so they reappear without
//! another measurement.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use projection::ar::{ArParams, project};
use tracing::debug;

use super::map::DEFAULT_IMAGE;
use super::{ArPlacement, ArSurface, RenderGate, Size, View, ViewKind};
use crate::bus::Handler;
use crate::events::{CameraChanged, GameObjectActionDone, GameObjectsUpdated, GeolocationChanged, OrientationChanged};
use crate::model::{GameAction, ObjectId};
use crate::sensor::SensorService;
use crate::sync::SyncService;
use crate::util::lock;

#[derive(Default)]
struct Overlay {
    sizes: HashMap<ObjectId, Size>,
    shown: HashSet<ObjectId>,
}

pub struct ArView {
    sync: Arc<SyncService>,
    sensor: Arc<SensorService>,
    surface: Arc<dyn ArSurface>,
    params: ArParams,
    gate: RenderGate,
    overlay: Mutex<Overlay>,
}

impl ArView {
    #[must_use]
    pub fn new(
        sync: Arc<SyncService>,
        sensor: Arc<SensorService>,
        surface: Arc<dyn ArSurface>,
        params: ArParams,
    ) -> Arc<Self> {
        Arc::new(Self { sync, sensor, surface, params, gate: RenderGate::new(), overlay: Mutex::new(Overlay::default()) })
    }

    /// Ids currently placed in the overlay, sorted.
    #[must_use]
    pub fn visible_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<_> = lock(&self.overlay).shown.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The player picked an action on an overlay element.
    pub fn on_element_action(&self, id: ObjectId, action: GameAction) {
        self.sync.spawn_action(Some(ViewKind::Ar), action, id);
    }

    fn render(&self) {
        let passes = self.gate.run(|| self.render_pass());
        if passes > 1 {
            debug!(passes, "ar render coalesced");
        }
    }

    fn render_pass(&self) {
        let snapshot = self.sync.snapshot();
        let player = self.sync.player_id();
        let position = self.sensor.position();
        let heading = self.sensor.orientation().heading;
        let mut overlay = lock(&self.overlay);

        // Forget elements whose object is gone.
        let gone: Vec<ObjectId> = overlay.sizes.keys().filter(|id| snapshot.get(**id).is_none()).copied().collect();
        for id in gone {
            self.surface.remove(id);
            overlay.sizes.remove(&id);
            overlay.shown.remove(&id);
        }

        for object in snapshot.iter() {
            let drawable = Some(object.id) != player && object.attributes.isonmap && position.is_known();
            let transform = if drawable {
                project(position.point(), heading, object.point(), self.params)
            } else {
                None
            };
            let Some(transform) = transform else {
                if overlay.shown.remove(&object.id) {
                    self.surface.conceal(object.id);
                }
                continue;
            };

            let image = object.attributes.image.as_deref().unwrap_or(DEFAULT_IMAGE);
            let image_url = self.sync.image_url(object.id, image);
            let size = *overlay.sizes.entry(object.id).or_insert_with(|| self.surface.measure(object.id, &image_url));
            self.surface.place(object.id, &ArPlacement { transform, size, image_url });
            overlay.shown.insert(object.id);
        }
    }
}

#[async_trait]
impl View for ArView {
    fn kind(&self) -> ViewKind {
        ViewKind::Ar
    }

    async fn activate(&self) {
        self.surface.set_visible(true);
        if let Err(e) = self.sensor.start_camera().await {
            debug!(error = %e, "ar view running without camera");
        }
        if self.gate.activate() {
            debug!("ar view activated");
        }
        self.render();
    }

    fn deactivate(&self) {
        self.surface.set_visible(false);
        self.sensor.stop_camera();
        if self.gate.deactivate() {
            debug!("ar view deactivated");
        }
    }

    fn is_active(&self) -> bool {
        self.gate.is_active()
    }
}

impl Handler<GameObjectsUpdated> for ArView {
    fn handle(&self, _event: &GameObjectsUpdated) {
        self.render();
    }
}

impl Handler<GeolocationChanged> for ArView {
    fn handle(&self, _event: &GeolocationChanged) {
        self.render();
    }
}

impl Handler<OrientationChanged> for ArView {
    fn handle(&self, _event: &OrientationChanged) {
        self.render();
    }
}

impl Handler<CameraChanged> for ArView {
    fn handle(&self, event: &CameraChanged) {
        self.surface.attach_stream(event.stream.as_ref());
    }
}

impl Handler<GameObjectActionDone> for ArView {
    fn handle(&self, event: &GameObjectActionDone) {
        if event.origin != Some(ViewKind::Ar) {
            return;
        }
        if let Some(message) = event.data.get("message").and_then(serde_json::Value::as_str) {
            self.surface.show_message(message);
        }
    }
}

#[cfg(test)]
#[path = "ar_test.rs"]
mod tests;
