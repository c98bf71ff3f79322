//! Application context: owns the bus, both services and both views.
//!
//! DESIGN
//! ======
//! Everything is constructed here and handed down explicitly; nothing is
//! global. Subscription order matters for geolocation: the sync service is
//! registered first so that by the time a view renders, the player's own
//! record has already been moved to the new fix.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::bus::EventBus;
use crate::config::ClientConfig;
use crate::events::{
    CameraChanged, GameObjectActionDone, GameObjectsUpdated, GeolocationChanged, OrientationChanged, UserNotice,
};
use crate::sensor::{SensorPlatform, SensorService};
use crate::sync::{ApiError, CredentialStore, GameApi, HttpGameApi, SyncError, SyncService};
use crate::util::lock;
use crate::views::log_surface::NoticeLog;
use crate::views::{ArSurface, ArView, MapSurface, MapView, View, ViewKind};

pub struct App {
    bus: EventBus,
    sensor: Arc<SensorService>,
    sync: Arc<SyncService>,
    map: Arc<MapView>,
    ar: Arc<ArView>,
    _notices: Arc<NoticeLog>,
    active: Mutex<Option<ViewKind>>,
}

impl App {
    #[must_use]
    pub fn new(
        config: &ClientConfig,
        platform: Arc<dyn SensorPlatform>,
        api: Arc<dyn GameApi>,
        credentials: Arc<dyn CredentialStore>,
        map_surface: Arc<dyn MapSurface>,
        ar_surface: Arc<dyn ArSurface>,
    ) -> Self {
        let bus = EventBus::new();
        let sensor = SensorService::new(platform, bus.clone(), config.sensor.clone());
        let sync = SyncService::new(api, credentials, bus.clone(), config.sync.clone());
        let map = MapView::new(sync.clone(), sensor.clone(), map_surface);
        let ar = ArView::new(sync.clone(), sensor.clone(), ar_surface, config.ar);
        let notices = Arc::new(NoticeLog);

        bus.subscribe::<GeolocationChanged, _>(&sync);

        bus.subscribe::<GameObjectsUpdated, _>(&map);
        bus.subscribe::<GeolocationChanged, _>(&map);
        bus.subscribe::<GameObjectActionDone, _>(&map);

        bus.subscribe::<GameObjectsUpdated, _>(&ar);
        bus.subscribe::<GeolocationChanged, _>(&ar);
        bus.subscribe::<OrientationChanged, _>(&ar);
        bus.subscribe::<CameraChanged, _>(&ar);
        bus.subscribe::<GameObjectActionDone, _>(&ar);

        bus.subscribe::<UserNotice, _>(&notices);

        Self { bus, sensor, sync, map, ar, _notices: notices, active: Mutex::new(None) }
    }

    /// Wire the context against the real HTTP server named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn with_http(
        config: &ClientConfig,
        platform: Arc<dyn SensorPlatform>,
        credentials: Arc<dyn CredentialStore>,
        map_surface: Arc<dyn MapSurface>,
        ar_surface: Arc<dyn ArSurface>,
    ) -> Result<Self, ApiError> {
        let api = Arc::new(HttpGameApi::new(&config.http, credentials.clone())?);
        Ok(Self::new(config, platform, api, credentials, map_surface, ar_surface))
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn sensor(&self) -> &Arc<SensorService> {
        &self.sensor
    }

    #[must_use]
    pub fn sync(&self) -> &Arc<SyncService> {
        &self.sync
    }

    #[must_use]
    pub fn map(&self) -> &Arc<MapView> {
        &self.map
    }

    #[must_use]
    pub fn ar(&self) -> &Arc<ArView> {
        &self.ar
    }

    #[must_use]
    pub fn active_view(&self) -> Option<ViewKind> {
        *lock(&self.active)
    }

    /// Start sensors, restore any stored session, and show `initial`.
    pub async fn start(&self, initial: ViewKind) {
        if let Err(e) = self.sensor.start_location() {
            warn!(error = %e, "starting without geolocation");
        }
        if !self.sensor.start_orientation() {
            warn!("starting without orientation");
        }
        if self.sync.player_id().is_none() {
            match self.sync.update_self().await {
                Ok(player_id) => info!(player_id, "session restored"),
                Err(SyncError::Api(ApiError::NoCredentials)) => info!("no stored session"),
                Err(e) => warn!(error = %e, "session restore failed"),
            }
        }
        self.switch_view(initial).await;
    }

    /// Deactivate the current view and activate `kind`.
    pub async fn switch_view(&self, kind: ViewKind) {
        let previous = lock(&self.active).replace(kind);
        if previous == Some(kind) {
            return;
        }
        if let Some(previous) = previous {
            self.view(previous).deactivate();
        }
        self.view(kind).activate().await;
        info!(view = %kind, "view active");
    }

    /// Deactivate the current view and stop every sensor.
    pub fn shutdown(&self) {
        if let Some(kind) = lock(&self.active).take() {
            self.view(kind).deactivate();
        }
        self.sensor.stop_location();
        self.sensor.stop_orientation();
        self.sensor.stop_camera();
        info!("client stopped");
    }

    fn view(&self, kind: ViewKind) -> &dyn View {
        match kind {
            ViewKind::Map => &*self.map,
            ViewKind::Ar => &*self.ar,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
