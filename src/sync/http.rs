//! `GameApi` over HTTP with Basic authentication.
//!
//! Thin reqwest wrapper: build URL, attach credentials, read status and body,
//! hand the body to the pure decoders in [`super::wire`].

use std::sync::Arc;

use projection::geo::LatLon;
use serde_json::Value;

use super::api::{ApiError, GameApi};
use super::credentials::CredentialStore;
use super::query::Filter;
use super::wire;
use crate::config::HttpConfig;
use crate::model::{GameAction, GameObject, ObjectId, World};

const OBJECT_FILTER_PARAM: &str = "filter[objects]";

pub struct HttpGameApi {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpGameApi {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to load.
    pub fn new(config: &HttpConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned(), credentials })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, ApiError> {
        let Some(credentials) = self.credentials.load() else {
            tracing::debug!(path, "no credentials; skipping request");
            return Err(ApiError::NoCredentials);
        };

        let response = self
            .http
            .get(self.url(path))
            .basic_auth(&credentials.username, Some(&credentials.password))
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Request(e.to_string()))?;
        check_status(status, text)
    }
}

fn check_status(status: u16, body: String) -> Result<String, ApiError> {
    match status {
        200..=299 => Ok(body),
        401 => Err(ApiError::Unauthorized),
        _ => Err(ApiError::Status { status, body }),
    }
}

fn object_path(id: ObjectId, rest: &str) -> String {
    format!("/api/v2/gameobject/{id}/{rest}")
}

#[async_trait::async_trait]
impl GameApi for HttpGameApi {
    async fn list_objects(&self, kind: &str, filters: &[Filter]) -> Result<Vec<GameObject>, ApiError> {
        let filter = serde_json::to_string(filters).map_err(|e| ApiError::Parse(e.to_string()))?;
        let text = self.get(&format!("/api/{kind}"), &[(OBJECT_FILTER_PARAM, filter)]).await?;
        wire::parse_objects(&text)
    }

    async fn fetch_self(&self) -> Result<GameObject, ApiError> {
        let text = self.get("/api/v2/gameobject_player/self", &[]).await?;
        wire::parse_object(&text)
    }

    async fn fetch_worlds(&self) -> Result<Vec<World>, ApiError> {
        let text = self.get("/api/world", &[]).await?;
        wire::parse_worlds(&text)
    }

    async fn join_world(&self, world: ObjectId) -> Result<(), ApiError> {
        self.get(&format!("/api/v2/world/{world}/player_join"), &[]).await?;
        Ok(())
    }

    async fn register(&self) -> Result<(), ApiError> {
        self.get("/api/v2/user/register", &[]).await?;
        Ok(())
    }

    async fn update_position(&self, id: ObjectId, point: LatLon) -> Result<(), ApiError> {
        let rest = format!("update_position/{},{}", point.latitude, point.longitude);
        self.get(&object_path(id, &rest), &[]).await?;
        Ok(())
    }

    async fn object_action(&self, id: ObjectId, action: GameAction) -> Result<Value, ApiError> {
        let text = self.get(&object_path(id, action.endpoint()), &[]).await?;
        wire::parse_payload(&text)
    }

    async fn available_images(&self, id: ObjectId) -> Result<Vec<String>, ApiError> {
        let text = self.get(&object_path(id, "available_images"), &[]).await?;
        wire::parse_images(&text)
    }

    async fn set_image(&self, id: ObjectId, image: &str) -> Result<(), ApiError> {
        self.get(&object_path(id, &format!("set_image/{image}")), &[]).await?;
        Ok(())
    }

    fn image_url(&self, id: ObjectId, image: &str) -> String {
        self.url(&object_path(id, &format!("image_raw/{image}")))
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
