//! Sensor service: fuses geolocation, orientation and camera input into one
//! device state and announces every change on the bus.
//!
//! DESIGN
//! ======
//! Each running sensor is a spawned task draining a platform feed. Starting
//! a sensor that is already running is a no-op, so there is never more than
//! one geolocation watch or orientation listener per service. Stopping
//! aborts the task, which drops the feed and detaches the platform listener.
//!
//! Samples pass through a leading-edge throttle before they touch state.
//! Geolocation errors are surfaced once; the same error repeating is
//! suppressed until a fix arrives or a different error replaces it.
//!
//! Camera acquisition failures are surfaced as well: `start_camera` returns
//! the error and a `UserNotice` is published. A stream that resolves after
//! `stop_camera` is released at once instead of being attached.

pub mod fusion;
pub mod platform;
pub mod simulated;

use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::config::{SensorConfig, Viewport};
use crate::events::{CameraChanged, GeolocationChanged, NoticeSource, OrientationChanged, UserNotice};
use crate::model::{Orientation, Position};
use crate::throttle::Throttle;
use crate::util::lock;

pub use platform::{
    CameraConstraints, CameraError, CameraStream, Facing, GeolocationError, OrientationFeed, OrientationSample,
    PositionFeed, SensorPlatform,
};

/// Snapshot of everything the sensors know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    pub position: Position,
    pub orientation: Orientation,
    pub camera: Option<CameraStream>,
}

#[derive(Default)]
struct CameraSlot {
    stream: Option<CameraStream>,
    pending: bool,
    /// Bumped by every stop so late acquisitions can tell they were cancelled.
    epoch: u64,
}

pub struct SensorService {
    me: Weak<Self>,
    platform: Arc<dyn SensorPlatform>,
    bus: EventBus,
    viewport: Mutex<Viewport>,
    position: Mutex<Position>,
    orientation: Mutex<Orientation>,
    last_geolocation_error: Mutex<Option<GeolocationError>>,
    location_throttle: Throttle,
    orientation_throttle: Throttle,
    location_task: Mutex<Option<JoinHandle<()>>>,
    orientation_task: Mutex<Option<JoinHandle<()>>>,
    camera: Mutex<CameraSlot>,
}

impl SensorService {
    #[must_use]
    pub fn new(platform: Arc<dyn SensorPlatform>, bus: EventBus, config: SensorConfig) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            platform,
            bus,
            viewport: Mutex::new(config.viewport),
            position: Mutex::new(Position::default()),
            orientation: Mutex::new(Orientation::default()),
            last_geolocation_error: Mutex::new(None),
            location_throttle: Throttle::new(config.throttle),
            orientation_throttle: Throttle::new(config.throttle),
            location_task: Mutex::new(None),
            orientation_task: Mutex::new(None),
            camera: Mutex::new(CameraSlot::default()),
        })
    }

    // --- Reads ---

    #[must_use]
    pub fn state(&self) -> DeviceState {
        DeviceState { position: self.position(), orientation: self.orientation(), camera: self.camera_stream() }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        *lock(&self.position)
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        *lock(&self.orientation)
    }

    #[must_use]
    pub fn camera_stream(&self) -> Option<CameraStream> {
        lock(&self.camera).stream.clone()
    }

    #[must_use]
    pub fn is_location_running(&self) -> bool {
        is_running(&self.location_task)
    }

    #[must_use]
    pub fn is_orientation_running(&self) -> bool {
        is_running(&self.orientation_task)
    }

    /// Size used for the next camera request.
    pub fn set_viewport(&self, viewport: Viewport) {
        *lock(&self.viewport) = viewport;
    }

    // --- Geolocation ---

    /// Open the geolocation watch. No-op while one is already running.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the platform's [`GeolocationError`] if the watch cannot be
    /// opened; the error is also surfaced to the player.
    pub fn start_location(&self) -> Result<(), GeolocationError> {
        let mut task = lock(&self.location_task);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(());
        }
        let mut feed = match self.platform.watch_position() {
            Ok(feed) => feed,
            Err(err) => {
                drop(task);
                self.handle_location_error(err.clone());
                return Err(err);
            }
        };
        let me = self.me.clone();
        *task = Some(tokio::spawn(async move {
            while let Some(sample) = feed.recv().await {
                let Some(service) = me.upgrade() else {
                    break;
                };
                service.handle_location_sample(sample, Instant::now());
            }
            debug!("geolocation feed closed");
        }));
        info!("geolocation watch started");
        Ok(())
    }

    pub fn stop_location(&self) {
        if let Some(handle) = lock(&self.location_task).take() {
            handle.abort();
            info!("geolocation watch stopped");
        }
    }

    /// Feed one platform sample through throttling and error suppression.
    /// Returns `true` if a new position was published.
    pub fn handle_location_sample(&self, sample: Result<Position, GeolocationError>, now: Instant) -> bool {
        match sample {
            Ok(position) => {
                if !self.location_throttle.try_acquire_at(now) {
                    return false;
                }
                *lock(&self.position) = position;
                *lock(&self.last_geolocation_error) = None;
                debug!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    accuracy = position.accuracy,
                    "geolocation changed"
                );
                self.bus.publish(&GeolocationChanged { position });
                true
            }
            Err(err) => {
                self.handle_location_error(err);
                false
            }
        }
    }

    fn handle_location_error(&self, err: GeolocationError) {
        {
            let mut last = lock(&self.last_geolocation_error);
            if last.as_ref() == Some(&err) {
                debug!(error = %err, "repeated geolocation error suppressed");
                return;
            }
            *last = Some(err.clone());
        }
        warn!(error = %err, "geolocation error");
        self.bus.publish(&UserNotice { source: NoticeSource::Geolocation, message: err.user_message().to_owned() });
    }

    // --- Orientation ---

    /// Register the orientation listener. No-op while one is already running.
    /// Returns `false` if the platform has no orientation sensor.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_orientation(&self) -> bool {
        let mut task = lock(&self.orientation_task);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return true;
        }
        let Some(mut feed) = self.platform.watch_orientation() else {
            warn!("device orientation unsupported");
            return false;
        };
        let me = self.me.clone();
        *task = Some(tokio::spawn(async move {
            while let Some(sample) = feed.recv().await {
                let Some(service) = me.upgrade() else {
                    break;
                };
                service.handle_orientation_sample(&sample, Instant::now());
            }
            debug!("orientation feed closed");
        }));
        info!("orientation listener started");
        true
    }

    /// Detach the listener and zero the orientation. Subscribers hear about
    /// the reset so nothing keeps placing against a stale heading.
    pub fn stop_orientation(&self) {
        if let Some(handle) = lock(&self.orientation_task).take() {
            handle.abort();
            info!("orientation listener stopped");
        }
        let orientation = Orientation::default();
        let previous = std::mem::replace(&mut *lock(&self.orientation), orientation);
        if previous != orientation {
            self.bus.publish(&OrientationChanged { orientation });
        }
    }

    /// Fuse one sample if the throttle allows. Returns `true` if published.
    pub fn handle_orientation_sample(&self, sample: &OrientationSample, now: Instant) -> bool {
        if !self.orientation_throttle.try_acquire_at(now) {
            return false;
        }
        let orientation = fusion::fuse(sample);
        *lock(&self.orientation) = orientation;
        self.bus.publish(&OrientationChanged { orientation });
        true
    }

    // --- Camera ---

    /// Acquire a rear-facing stream sized to the viewport. No-op if a stream
    /// is attached or a request is already in flight.
    ///
    /// # Errors
    ///
    /// Returns the platform's [`CameraError`]; the player is notified too.
    pub async fn start_camera(&self) -> Result<(), CameraError> {
        let epoch = {
            let mut slot = lock(&self.camera);
            if slot.stream.is_some() || slot.pending {
                return Ok(());
            }
            slot.pending = true;
            slot.epoch
        };

        let constraints = CameraConstraints::rear(*lock(&self.viewport));
        let result = self.platform.request_camera(constraints).await;

        let mut slot = lock(&self.camera);
        if slot.epoch != epoch {
            drop(slot);
            if let Ok(stream) = result {
                debug!(stream = %stream.id, "camera stopped during acquisition; releasing");
                self.platform.release_camera(&stream);
            }
            return Ok(());
        }
        slot.pending = false;
        match result {
            Ok(stream) => {
                slot.stream = Some(stream.clone());
                drop(slot);
                info!(stream = %stream.id, width = stream.width, height = stream.height, "camera started");
                self.bus.publish(&CameraChanged { stream: Some(stream) });
                Ok(())
            }
            Err(err) => {
                drop(slot);
                warn!(error = %err, "camera acquisition failed");
                self.bus.publish(&UserNotice { source: NoticeSource::Camera, message: err.user_message().to_owned() });
                Err(err)
            }
        }
    }

    pub fn stop_camera(&self) {
        let stream = {
            let mut slot = lock(&self.camera);
            slot.epoch += 1;
            slot.pending = false;
            slot.stream.take()
        };
        if let Some(stream) = stream {
            self.platform.release_camera(&stream);
            info!(stream = %stream.id, "camera stopped");
            self.bus.publish(&CameraChanged { stream: None });
        }
    }
}

impl Drop for SensorService {
    fn drop(&mut self) {
        for task in [&self.location_task, &self.orientation_task] {
            if let Some(handle) = lock(task).take() {
                handle.abort();
            }
        }
    }
}

fn is_running(task: &Mutex<Option<JoinHandle<()>>>) -> bool {
    lock(task).as_ref().is_some_and(|handle| !handle.is_finished())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
