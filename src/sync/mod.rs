//! Sync service: the local mirror of nearby game objects and the session.
//!
//! DESIGN
//! ======
//! The canonical store is an `Arc<ObjectSnapshot>` replaced wholesale. A
//! reconciliation cycle issues one spatial query per tracked kind and merges
//! the responses as they arrive; the merged buffer is promoted only after
//! every kind has reported. Each cycle is tagged with a generation. Starting
//! a newer cycle or logging out advances the generation, so an older cycle
//! abandons itself and its late responses are never merged. The generation
//! check and the store swap happen under the store lock.
//!
//! A failed request leaves its cycle incomplete and the store untouched;
//! the next geolocation push or bounds change retries. A 401 from anywhere
//! forces logout.
//!
//! While logged out every cycle is a no-op that clears the store and
//! notifies subscribers without touching the network.
//!
//! Every logout bumps a session epoch. Session and action requests capture
//! the epoch before awaiting the server and drop their result if it moved,
//! so a response landing after logout cannot revive the player or reach the
//! views.

pub mod api;
pub mod credentials;
pub mod http;
pub mod query;
pub mod reconcile;
pub mod wire;

use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use projection::geo::Bounds;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::{EventBus, Handler};
use crate::config::SyncConfig;
use crate::events::{GameObjectActionDone, GameObjectsUpdated, GeolocationChanged, NoticeSource, SessionChanged, UserNotice};
use crate::model::{GameAction, GameObject, ObjectId, ObjectSnapshot, Position, World};
use crate::throttle::Throttle;
use crate::util::lock;
use crate::views::ViewKind;

pub use api::{ApiError, GameApi};
pub use credentials::{CredentialError, CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
pub use http::HttpGameApi;
pub use reconcile::{CycleToken, Generation, ReconciliationBuffer};

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error("not logged in")]
    NotLoggedIn,
}

/// How one reconciliation cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Store replaced; carries the number of objects now mirrored.
    Committed(usize),
    /// No player; store cleared without any request.
    LoggedOut,
    /// A newer cycle or a logout took over; results discarded.
    Superseded,
    /// A request failed; store unchanged.
    Failed(ApiError),
}

#[derive(Debug, Default)]
struct Session {
    epoch: u64,
    player_id: Option<ObjectId>,
    world_id: Option<ObjectId>,
    worlds: Vec<World>,
}

pub struct SyncService {
    me: Weak<Self>,
    api: Arc<dyn GameApi>,
    credentials: Arc<dyn CredentialStore>,
    bus: EventBus,
    config: SyncConfig,
    session: Mutex<Session>,
    viewport: Mutex<Option<Bounds>>,
    position: Mutex<Position>,
    store: Mutex<Arc<ObjectSnapshot>>,
    generation: Generation,
    push_throttle: Throttle,
}

impl SyncService {
    #[must_use]
    pub fn new(
        api: Arc<dyn GameApi>,
        credentials: Arc<dyn CredentialStore>,
        bus: EventBus,
        config: SyncConfig,
    ) -> Arc<Self> {
        let push_throttle = Throttle::new(config.push_interval);
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            api,
            credentials,
            bus,
            config,
            session: Mutex::new(Session::default()),
            viewport: Mutex::new(None),
            position: Mutex::new(Position::default()),
            store: Mutex::new(Arc::new(ObjectSnapshot::default())),
            generation: Generation::new(),
            push_throttle,
        })
    }

    // --- Reads ---

    #[must_use]
    pub fn player_id(&self) -> Option<ObjectId> {
        lock(&self.session).player_id
    }

    #[must_use]
    pub fn world_id(&self) -> Option<ObjectId> {
        lock(&self.session).world_id
    }

    #[must_use]
    pub fn worlds(&self) -> Vec<World> {
        lock(&self.session).worlds.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<ObjectSnapshot> {
        lock(&self.store).clone()
    }

    fn session_epoch(&self) -> u64 {
        lock(&self.session).epoch
    }

    /// The player, if still logged in within session `epoch`.
    fn player_in(&self, epoch: u64) -> Option<ObjectId> {
        let session = lock(&self.session);
        session.player_id.filter(|_| session.epoch == epoch)
    }

    /// The player's own record from the current store.
    #[must_use]
    pub fn player(&self) -> Option<GameObject> {
        let id = self.player_id()?;
        lock(&self.store).get(id).cloned()
    }

    /// Bounds the next cycle will query: the map viewport if one was set,
    /// otherwise a box around the last known position.
    #[must_use]
    pub fn query_bounds(&self) -> Option<Bounds> {
        if let Some(bounds) = *lock(&self.viewport) {
            return Some(bounds);
        }
        let position = *lock(&self.position);
        position.is_known().then(|| Bounds::around(position.point(), self.config.query_radius_m))
    }

    // --- Reconciliation ---

    /// Record the map viewport and start a fresh cycle.
    pub fn set_bounds(&self, bounds: Bounds) -> Option<JoinHandle<CycleOutcome>> {
        debug!(
            sw_lat = bounds.southwest.latitude,
            sw_lon = bounds.southwest.longitude,
            ne_lat = bounds.northeast.latitude,
            ne_lon = bounds.northeast.longitude,
            "bounds changed"
        );
        *lock(&self.viewport) = Some(bounds);
        self.spawn_update()
    }

    /// Run `update_game_objects` on the current runtime, if there is one.
    pub fn spawn_update(&self) -> Option<JoinHandle<CycleOutcome>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let me = self.me.upgrade()?;
        Some(handle.spawn(async move { me.update_game_objects().await }))
    }

    /// One reconciliation cycle. Supersedes any cycle still in flight.
    pub async fn update_game_objects(&self) -> CycleOutcome {
        let (player, world) = {
            let session = lock(&self.session);
            (session.player_id, session.world_id)
        };
        let Some(player) = player else {
            self.clear_store();
            return CycleOutcome::LoggedOut;
        };

        let mut token = self.generation.advance();
        let kinds = self.config.tracked_kinds.clone();
        let filters = query::spatial_filter(self.query_bounds().as_ref(), world, player);
        let mut buffer = ReconciliationBuffer::new(token.generation(), &kinds);
        debug!(generation = token.generation(), kinds = kinds.len(), "reconciliation cycle started");

        let mut requests: FuturesUnordered<_> = kinds
            .into_iter()
            .map(|kind| {
                let api = self.api.clone();
                let filters = filters.clone();
                async move {
                    let result = api.list_objects(&kind, &filters).await;
                    (kind, result)
                }
            })
            .collect();

        while !buffer.is_complete() {
            tokio::select! {
                () = token.superseded() => {
                    debug!(generation = token.generation(), "reconciliation cycle superseded");
                    return CycleOutcome::Superseded;
                }
                next = requests.next() => match next {
                    Some((kind, Ok(objects))) => {
                        debug!(generation = token.generation(), kind, count = objects.len(), "kind reported");
                        buffer.merge(&kind, objects);
                    }
                    Some((kind, Err(err))) => {
                        debug!(generation = token.generation(), kind, error = %err, "reconciliation request failed");
                        self.handle_api_error(&err);
                        return CycleOutcome::Failed(err);
                    }
                    None => break,
                },
            }
        }

        self.commit(&token, buffer)
    }

    fn commit(&self, token: &CycleToken, buffer: ReconciliationBuffer) -> CycleOutcome {
        let Some(snapshot) = buffer.into_snapshot() else {
            return CycleOutcome::Superseded;
        };
        let snapshot = Arc::new(snapshot);
        {
            let mut store = lock(&self.store);
            if !token.is_current() {
                debug!(generation = token.generation(), "stale cycle result dropped");
                return CycleOutcome::Superseded;
            }
            *store = snapshot.clone();
        }
        let count = snapshot.len();
        debug!(generation = token.generation(), count, "reconciliation committed");
        self.bus.publish(&GameObjectsUpdated { snapshot });
        CycleOutcome::Committed(count)
    }

    fn clear_store(&self) {
        let snapshot = {
            let mut store = lock(&self.store);
            let generation = self.generation.invalidate();
            *store = Arc::new(ObjectSnapshot::new(generation, Default::default()));
            store.clone()
        };
        debug!("store cleared");
        self.bus.publish(&GameObjectsUpdated { snapshot });
    }

    // --- Geolocation ---

    /// Move the player's own record locally and push upstream if the push
    /// window allows. Returns the push task when one was started.
    pub fn handle_geolocation_at(&self, position: Position, now: Instant) -> Option<JoinHandle<()>> {
        *lock(&self.position) = position;
        let player = self.player_id()?;

        {
            let mut store = lock(&self.store);
            if store.get(player).is_some() {
                let snapshot = Arc::make_mut(&mut *store);
                if let Some(own) = snapshot.objects.get_mut(&player) {
                    own.latitude = position.latitude;
                    own.longitude = position.longitude;
                }
            }
        }

        if !self.push_throttle.try_acquire_at(now) {
            return None;
        }
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let me = self.me.upgrade()?;
        Some(handle.spawn(async move {
            match me.api.update_position(player, position.point()).await {
                Ok(()) => {
                    debug!(player, "position pushed");
                    me.update_game_objects().await;
                }
                Err(err) => {
                    debug!(player, error = %err, "position push failed");
                    me.handle_api_error(&err);
                }
            }
        }))
    }

    // --- Session ---

    /// Fetch the own record and joinable worlds, then reconcile.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error; a 401 also logs out.
    /// [`SyncError::NotLoggedIn`] if a logout happened while waiting.
    pub async fn update_self(&self) -> Result<ObjectId, SyncError> {
        let epoch = self.session_epoch();
        let player = self.api.fetch_self().await.map_err(|err| self.api_failure(err))?;
        let worlds = self.api.fetch_worlds().await.map_err(|err| self.api_failure(err))?;

        let changed = {
            let mut session = lock(&self.session);
            if session.epoch != epoch {
                debug!(player_id = player.id, "logged out while fetching own record; result dropped");
                return Err(SyncError::NotLoggedIn);
            }
            let changed = session.player_id != Some(player.id);
            session.player_id = Some(player.id);
            session.world_id = player.relationships.world;
            session.worlds = worlds;
            changed
        };
        if changed {
            info!(player_id = player.id, world_id = ?player.relationships.world, "player session established");
            self.bus.publish(&SessionChanged { player_id: Some(player.id) });
        }

        self.update_game_objects().await;
        Ok(player.id)
    }

    /// Store `credentials` and establish the session.
    ///
    /// # Errors
    ///
    /// Fails if the credentials cannot be stored or the server rejects them.
    pub async fn login(&self, credentials: Credentials) -> Result<ObjectId, SyncError> {
        info!(username = %credentials.username, "logging in");
        self.credentials.save(&credentials)?;
        self.update_self().await
    }

    /// Create an account for `credentials`, then log in with it.
    ///
    /// # Errors
    ///
    /// Fails if the credentials cannot be stored or registration is refused.
    pub async fn register(&self, credentials: Credentials) -> Result<ObjectId, SyncError> {
        info!(username = %credentials.username, "registering");
        self.credentials.save(&credentials)?;
        self.api.register().await.map_err(|err| self.api_failure(err))?;
        self.update_self().await
    }

    /// Forget credentials and player, abandon in-flight cycles, clear store.
    pub fn logout(&self) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear stored credentials");
        }
        let previous = {
            let mut session = lock(&self.session);
            session.epoch += 1;
            let previous = session.player_id.take();
            session.world_id = None;
            session.worlds.clear();
            previous
        };
        self.push_throttle.reset();
        self.clear_store();
        if let Some(player_id) = previous {
            info!(player_id, "logged out");
            self.bus.publish(&SessionChanged { player_id: None });
        }
    }

    /// Join world `world`, then refresh the session.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotLoggedIn`] without a player; otherwise the API error.
    pub async fn join_world(&self, world: ObjectId) -> Result<ObjectId, SyncError> {
        self.player_id().ok_or(SyncError::NotLoggedIn)?;
        self.api.join_world(world).await.map_err(|err| self.api_failure(err))?;
        info!(world_id = world, "joined world");
        self.update_self().await
    }

    // --- Actions ---

    /// # Errors
    ///
    /// See [`SyncService::run_action`].
    pub async fn item_collect(&self, origin: Option<ViewKind>, id: ObjectId) -> Result<Value, SyncError> {
        self.run_action(origin, GameAction::Collect, id).await
    }

    /// # Errors
    ///
    /// See [`SyncService::run_action`].
    pub async fn item_place(&self, origin: Option<ViewKind>, id: ObjectId) -> Result<Value, SyncError> {
        self.run_action(origin, GameAction::Place, id).await
    }

    /// # Errors
    ///
    /// See [`SyncService::run_action`].
    pub async fn npc_talk(&self, origin: Option<ViewKind>, id: ObjectId) -> Result<Value, SyncError> {
        self.run_action(origin, GameAction::Talk, id).await
    }

    /// Run a remote action, announce its payload, then reconcile to pick up
    /// server-side effects.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotLoggedIn`] without a player, or if a logout happened
    /// while the request was in flight; otherwise the API error.
    pub async fn run_action(&self, origin: Option<ViewKind>, action: GameAction, id: ObjectId) -> Result<Value, SyncError> {
        let epoch = self.session_epoch();
        self.player_in(epoch).ok_or(SyncError::NotLoggedIn)?;
        let data = self.api.object_action(id, action).await.map_err(|err| self.api_failure(err))?;
        if self.player_in(epoch).is_none() {
            debug!(object_id = id, ?action, "logged out during action; result dropped");
            return Err(SyncError::NotLoggedIn);
        }
        debug!(object_id = id, ?action, "action done");
        self.bus.publish(&GameObjectActionDone { origin, action, object_id: id, data: data.clone() });
        self.update_game_objects().await;
        Ok(data)
    }

    /// Fire-and-forget variant of [`SyncService::run_action`] for views.
    pub fn spawn_action(&self, origin: Option<ViewKind>, action: GameAction, id: ObjectId) -> Option<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let me = self.me.upgrade()?;
        Some(handle.spawn(async move {
            if let Err(e) = me.run_action(origin, action, id).await {
                warn!(object_id = id, ?action, error = %e, "action failed");
            }
        }))
    }

    // --- Media ---

    #[must_use]
    pub fn image_url(&self, id: ObjectId, image: &str) -> String {
        self.api.image_url(id, image)
    }

    /// # Errors
    ///
    /// Returns the API error; a 401 also logs out.
    pub async fn available_images(&self, id: ObjectId) -> Result<Vec<String>, SyncError> {
        self.api.available_images(id).await.map_err(|err| self.api_failure(err))
    }

    /// Change an object's image, then reconcile so markers pick it up.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotLoggedIn`] without a player, or if a logout happened
    /// while the request was in flight; otherwise the API error.
    pub async fn set_image(&self, id: ObjectId, image: &str) -> Result<(), SyncError> {
        let epoch = self.session_epoch();
        self.player_in(epoch).ok_or(SyncError::NotLoggedIn)?;
        self.api.set_image(id, image).await.map_err(|err| self.api_failure(err))?;
        if self.player_in(epoch).is_none() {
            debug!(object_id = id, "logged out during image change; result dropped");
            return Err(SyncError::NotLoggedIn);
        }
        self.update_game_objects().await;
        Ok(())
    }

    // --- Errors ---

    fn api_failure(&self, err: ApiError) -> SyncError {
        self.handle_api_error(&err);
        SyncError::Api(err)
    }

    fn handle_api_error(&self, err: &ApiError) {
        if !err.is_unauthorized() {
            return;
        }
        warn!("server rejected credentials; logging out");
        self.logout();
        self.bus.publish(&UserNotice { source: NoticeSource::Session, message: SESSION_EXPIRED_MESSAGE.to_owned() });
    }
}

impl Handler<GeolocationChanged> for SyncService {
    fn handle(&self, event: &GeolocationChanged) {
        self.handle_geolocation_at(event.position, Instant::now());
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
