//! Stand-in platform for headless runs: a settable fix and heading re-emitted
//! on an interval, and a synthetic camera.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::model::Position;
use crate::util::lock;

use super::platform::{
    CameraConstraints, CameraError, CameraStream, GeolocationError, OrientationFeed, OrientationSample, PositionFeed,
    SensorPlatform,
};

const FEED_CAPACITY: usize = 16;
const SIMULATED_ACCURACY_M: f64 = 5.0;

pub struct SimulatedPlatform {
    fix: Arc<Mutex<Position>>,
    heading: Arc<Mutex<f64>>,
    interval: Duration,
    camera: bool,
}

impl SimulatedPlatform {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, heading: f64, interval: Duration) -> Self {
        Self {
            fix: Arc::new(Mutex::new(Position { latitude, longitude, accuracy: SIMULATED_ACCURACY_M, timestamp: 0 })),
            heading: Arc::new(Mutex::new(heading)),
            interval,
            camera: true,
        }
    }

    /// Make every camera request fail with [`CameraError::Unsupported`].
    #[must_use]
    pub fn without_camera(mut self) -> Self {
        self.camera = false;
        self
    }

    /// Move the simulated device. Picked up by the next emitted sample.
    pub fn move_to(&self, latitude: f64, longitude: f64) {
        let mut fix = lock(&self.fix);
        fix.latitude = latitude;
        fix.longitude = longitude;
    }

    pub fn turn_to(&self, heading: f64) {
        *lock(&self.heading) = heading;
    }
}

#[async_trait::async_trait]
impl SensorPlatform for SimulatedPlatform {
    fn watch_position(&self) -> Result<PositionFeed, GeolocationError> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let fix = self.fix.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let sample = Position { timestamp: now_millis(), ..*lock(&fix) };
                if tx.send(Ok(sample)).await.is_err() {
                    debug!("simulated geolocation watch detached");
                    break;
                }
            }
        });
        Ok(rx)
    }

    fn watch_orientation(&self) -> Option<OrientationFeed> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let heading = self.heading.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let bearing = *lock(&heading);
                let sample = OrientationSample {
                    alpha: (360.0 - bearing).rem_euclid(360.0),
                    beta: 0.0,
                    gamma: 0.0,
                    heading: Some(bearing),
                    absolute: true,
                };
                if tx.send(sample).await.is_err() {
                    debug!("simulated orientation listener detached");
                    break;
                }
            }
        });
        Some(rx)
    }

    async fn request_camera(&self, constraints: CameraConstraints) -> Result<CameraStream, CameraError> {
        if !self.camera {
            return Err(CameraError::Unsupported);
        }
        Ok(CameraStream { id: Uuid::new_v4().to_string(), width: constraints.width, height: constraints.height })
    }

    fn release_camera(&self, stream: &CameraStream) {
        debug!(stream = %stream.id, "simulated camera released");
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
#[path = "simulated_test.rs"]
mod tests;
