use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::models::{
    AdminUpdate, AuthResponse, Event, EventPayload, LoginRequest, RegisterRequest, UserRecord,
};

// --- Collaborator Contracts ---
//
// The stores only ever talk to these traits, so tests swap in hand-written mocks
// and the binary wires in `HttpApiClient`. Calls that may carry credentials take
// the caller's current token explicitly rather than reading it from anywhere global.

/// AuthApi
///
/// The external authentication collaborator. Token issuance and verification
/// live entirely on the other side of this trait.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// POST /auth/login
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError>;
    /// POST /auth/register
    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError>;
    /// GET /auth/me. Returns the raw body; normalization is the session's job.
    async fn me(&self, token: &str) -> Result<Value, ApiError>;
}

/// EventApi
///
/// The events resource. `list_events` hands back the raw body because the
/// collection store decides what to make of a non-array response.
#[async_trait]
pub trait EventApi: Send + Sync {
    async fn list_events(&self, token: Option<&str>) -> Result<Value, ApiError>;
    async fn get_event(&self, token: Option<&str>, id: i64) -> Result<Event, ApiError>;
    async fn create_event(
        &self,
        token: Option<&str>,
        payload: &EventPayload,
    ) -> Result<Event, ApiError>;
    async fn update_event(
        &self,
        token: Option<&str>,
        id: i64,
        payload: &EventPayload,
    ) -> Result<Event, ApiError>;
    async fn delete_event(&self, token: Option<&str>, id: i64) -> Result<(), ApiError>;
}

/// AdminApi
///
/// User administration, only reachable with an administrator token.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_users(&self, token: Option<&str>) -> Result<Vec<UserRecord>, ApiError>;
    async fn set_user_admin(
        &self,
        token: Option<&str>,
        id: i64,
        update: AdminUpdate,
    ) -> Result<UserRecord, ApiError>;
    async fn delete_user(&self, token: Option<&str>, id: i64) -> Result<(), ApiError>;
}

pub type AuthApiState = Arc<dyn AuthApi>;
pub type EventApiState = Arc<dyn EventApi>;
pub type AdminApiState = Arc<dyn AdminApi>;

// --- HTTP Implementation ---

/// HttpApiClient
///
/// reqwest-backed implementation of all three collaborator traits. Every call
/// carries a fresh `x-request-id` so client and server logs can be correlated,
/// plus `Authorization: Bearer <token>` whenever a token is held.
#[derive(Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4().to_string();
        tracing::debug!(method = %method, path, req_id = %request_id, "outbound request");

        let mut req = self
            .client
            .request(method, url)
            .header("x-request-id", request_id);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Sends the request and turns transport failures and non-2xx statuses into `ApiError`.
    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!("request failed without a response: {}", e);
            ApiError::Network(e.to_string())
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        if status.as_u16() == 401 {
            tracing::info!("server rejected credentials (401)");
        }
        Err(ApiError::from_status(status.as_u16(), body))
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.send(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.json(self.request(Method::POST, "/auth/login", None).json(req))
            .await
    }

    async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.json(self.request(Method::POST, "/auth/register", None).json(req))
            .await
    }

    async fn me(&self, token: &str) -> Result<Value, ApiError> {
        self.json(self.request(Method::GET, "/auth/me", Some(token)))
            .await
    }
}

#[async_trait]
impl EventApi for HttpApiClient {
    async fn list_events(&self, token: Option<&str>) -> Result<Value, ApiError> {
        self.json(self.request(Method::GET, "/events/", token)).await
    }

    async fn get_event(&self, token: Option<&str>, id: i64) -> Result<Event, ApiError> {
        self.json(self.request(Method::GET, &format!("/events/{}", id), token))
            .await
    }

    async fn create_event(
        &self,
        token: Option<&str>,
        payload: &EventPayload,
    ) -> Result<Event, ApiError> {
        self.json(self.request(Method::POST, "/events/", token).json(payload))
            .await
    }

    async fn update_event(
        &self,
        token: Option<&str>,
        id: i64,
        payload: &EventPayload,
    ) -> Result<Event, ApiError> {
        self.json(
            self.request(Method::PUT, &format!("/events/{}", id), token)
                .json(payload),
        )
        .await
    }

    async fn delete_event(&self, token: Option<&str>, id: i64) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/events/{}", id), token))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AdminApi for HttpApiClient {
    async fn list_users(&self, token: Option<&str>) -> Result<Vec<UserRecord>, ApiError> {
        self.json(self.request(Method::GET, "/admin/users", token))
            .await
    }

    async fn set_user_admin(
        &self,
        token: Option<&str>,
        id: i64,
        update: AdminUpdate,
    ) -> Result<UserRecord, ApiError> {
        self.json(
            self.request(Method::PUT, &format!("/admin/users/{}/admin", id), token)
                .json(&update),
        )
        .await
    }

    async fn delete_user(&self, token: Option<&str>, id: i64) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, &format!("/admin/users/{}", id), token))
            .await?;
        Ok(())
    }
}
