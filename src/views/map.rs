//! Map view: one marker per on-map object, diffed against the live set.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use projection::geo::Bounds;
use projection::markers::{MarkerRef, MarkerSpec, map_marker_diff};
use tracing::debug;

use super::{MapSurface, RenderGate, View, ViewKind};
use crate::bus::Handler;
use crate::events::{GameObjectActionDone, GameObjectsUpdated, GeolocationChanged};
use crate::model::{GameAction, GameObject, ObjectId};
use crate::sensor::SensorService;
use crate::sync::SyncService;
use crate::util::lock;

/// Image used for objects that do not name one.
pub(crate) const DEFAULT_IMAGE: &str = "default";

struct MarkerEntry {
    icon_url: String,
}

impl MarkerRef for MarkerEntry {
    fn icon_url(&self) -> &str {
        &self.icon_url
    }
}

pub struct MapView {
    sync: Arc<SyncService>,
    sensor: Arc<SensorService>,
    surface: Arc<dyn MapSurface>,
    gate: RenderGate,
    markers: Mutex<HashMap<ObjectId, MarkerEntry>>,
    centered: Mutex<bool>,
}

impl MapView {
    #[must_use]
    pub fn new(sync: Arc<SyncService>, sensor: Arc<SensorService>, surface: Arc<dyn MapSurface>) -> Arc<Self> {
        Arc::new(Self {
            sync,
            sensor,
            surface,
            gate: RenderGate::new(),
            markers: Mutex::new(HashMap::new()),
            centered: Mutex::new(false),
        })
    }

    /// Ids with a live marker, sorted.
    #[must_use]
    pub fn marker_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<_> = lock(&self.markers).keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The map was panned or zoomed: query the new area.
    pub fn on_viewport_changed(&self, bounds: Bounds) {
        if self.gate.is_active() {
            self.sync.set_bounds(bounds);
        }
    }

    /// The player picked an action on a marker.
    pub fn on_marker_action(&self, id: ObjectId, action: GameAction) {
        self.sync.spawn_action(Some(ViewKind::Map), action, id);
    }

    fn render(&self) {
        let passes = self.gate.run(|| self.render_pass());
        if passes > 1 {
            debug!(passes, "map render coalesced");
        }
    }

    fn render_pass(&self) {
        let snapshot = self.sync.snapshot();
        let player = self.sync.player_id();
        let objects: HashMap<ObjectId, &GameObject> = snapshot.iter().map(|object| (object.id, object)).collect();
        let specs: Vec<MarkerSpec<ObjectId>> = snapshot
            .iter()
            .map(|object| MarkerSpec {
                id: object.id,
                icon_url: self.icon_url(object),
                on_map: object.attributes.isonmap || Some(object.id) == player,
            })
            .collect();

        let mut markers = lock(&self.markers);
        let diff = map_marker_diff(&*markers, &specs);

        for id in &diff.remove {
            self.surface.remove_marker(*id);
            markers.remove(id);
        }
        for spec in specs.iter().filter(|spec| diff.create.contains(&spec.id)) {
            if let Some(object) = objects.get(&spec.id) {
                self.surface.add_marker(spec.id, &spec.icon_url, object.point(), object.display_name());
                markers.insert(spec.id, MarkerEntry { icon_url: spec.icon_url.clone() });
            }
        }
        for id in &diff.keep {
            if let Some(object) = objects.get(id) {
                self.surface.move_marker(*id, object.point());
            }
        }
    }

    fn icon_url(&self, object: &GameObject) -> String {
        let image = object.attributes.image.as_deref().unwrap_or(DEFAULT_IMAGE);
        self.sync.image_url(object.id, image)
    }

    fn center_once(&self) {
        let position = self.sensor.position();
        if !position.is_known() {
            return;
        }
        let mut centered = lock(&self.centered);
        if !*centered {
            *centered = true;
            self.surface.center_on(position.point());
        }
    }
}

#[async_trait]
impl View for MapView {
    fn kind(&self) -> ViewKind {
        ViewKind::Map
    }

    async fn activate(&self) {
        self.surface.set_visible(true);
        if self.gate.activate() {
            debug!("map view activated");
        }
        self.center_once();
        self.render();
    }

    fn deactivate(&self) {
        self.surface.set_visible(false);
        if self.gate.deactivate() {
            debug!("map view deactivated");
        }
    }

    fn is_active(&self) -> bool {
        self.gate.is_active()
    }
}

impl Handler<GameObjectsUpdated> for MapView {
    fn handle(&self, _event: &GameObjectsUpdated) {
        self.render();
    }
}

impl Handler<GeolocationChanged> for MapView {
    fn handle(&self, _event: &GeolocationChanged) {
        if !self.gate.is_active() {
            return;
        }
        self.center_once();
        self.render();
    }
}

impl Handler<GameObjectActionDone> for MapView {
    fn handle(&self, event: &GameObjectActionDone) {
        if event.origin != Some(ViewKind::Map) {
            return;
        }
        if let Some(message) = event.data.get("message").and_then(serde_json::Value::as_str) {
            self.surface.show_message(message);
        }
    }
}

#[cfg(test)]
#[path = "map_test.rs"]
mod tests;
