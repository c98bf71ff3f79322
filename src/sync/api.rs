//! Remote game store interface.

use projection::geo::LatLon;
use serde_json::Value;

use super::query::Filter;
use crate::model::{GameAction, GameObject, ObjectId, World};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("no stored credentials; request skipped")]
    NoCredentials,
    #[error("server rejected credentials (401)")]
    Unauthorized,
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Server endpoints the client consumes. Every call authenticates with the
/// stored credentials and fails with [`ApiError::NoCredentials`] without
/// touching the network when there are none.
#[async_trait::async_trait]
pub trait GameApi: Send + Sync {
    /// Objects of one kind matching `filters`.
    async fn list_objects(&self, kind: &str, filters: &[Filter]) -> Result<Vec<GameObject>, ApiError>;

    /// The logged-in player's own record.
    async fn fetch_self(&self) -> Result<GameObject, ApiError>;

    /// Worlds the player may join.
    async fn fetch_worlds(&self) -> Result<Vec<World>, ApiError>;

    async fn join_world(&self, world: ObjectId) -> Result<(), ApiError>;

    /// Create an account for the stored credentials.
    async fn register(&self) -> Result<(), ApiError>;

    async fn update_position(&self, id: ObjectId, point: LatLon) -> Result<(), ApiError>;

    /// Run `action` on object `id`; returns the server's payload.
    async fn object_action(&self, id: ObjectId, action: GameAction) -> Result<Value, ApiError>;

    async fn available_images(&self, id: ObjectId) -> Result<Vec<String>, ApiError>;

    async fn set_image(&self, id: ObjectId, image: &str) -> Result<(), ApiError>;

    /// Absolute URL of an object's image. No request is made.
    fn image_url(&self, id: ObjectId, image: &str) -> String;
}
