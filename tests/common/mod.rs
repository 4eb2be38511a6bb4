#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use eventboard_client::{
    ApiError, SessionStore,
    api::{AdminApi, AuthApi, EventApi},
    models::{AdminUpdate, AuthResponse, Event, EventPayload, LoginRequest, RegisterRequest, UserRecord},
    storage::{MockTokenStorage, TokenStore},
};
use serde_json::{Value, json};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Notify;

// --- Mock Auth Collaborator ---

/// What `/auth/me` answers with.
#[derive(Clone)]
pub enum MeResponse {
    Body(Value),
    Status(u16),
    Network,
}

pub struct MockAuthApi {
    pub me_response: Mutex<MeResponse>,
    /// When set, `me` blocks until the test calls `notify_one`.
    pub me_gate: Option<Arc<Notify>>,
    pub me_calls: AtomicUsize,
    pub tokens_seen: Mutex<Vec<String>>,
    /// Token handed out by login/register; `None` answers without one.
    pub issued_token: Option<String>,
    /// When set, login/register fail with this status and a field-error body.
    pub auth_status: Option<u16>,
}

impl MockAuthApi {
    pub fn answering(body: Value) -> Self {
        Self {
            me_response: Mutex::new(MeResponse::Body(body)),
            me_gate: None,
            me_calls: AtomicUsize::new(0),
            tokens_seen: Mutex::new(vec![]),
            issued_token: Some("issued-token".to_string()),
            auth_status: None,
        }
    }

    pub fn failing(status: u16) -> Self {
        let mock = Self::answering(Value::Null);
        *mock.me_response.lock().unwrap() = MeResponse::Status(status);
        mock
    }

    pub fn unreachable() -> Self {
        let mock = Self::answering(Value::Null);
        *mock.me_response.lock().unwrap() = MeResponse::Network;
        mock
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.me_gate = Some(gate);
        self
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    fn auth_result(&self) -> Result<AuthResponse, ApiError> {
        if let Some(status) = self.auth_status {
            return Err(ApiError::from_status(
                status,
                json!({"detail": [{"loc": ["body", "email"], "msg": "invalid email"}]}),
            ));
        }
        Ok(AuthResponse {
            access_token: self.issued_token.clone(),
            token_type: Some("bearer".to_string()),
            ..AuthResponse::default()
        })
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.auth_result()
    }

    async fn register(&self, _req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.auth_result()
    }

    async fn me(&self, token: &str) -> Result<Value, ApiError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.to_string());
        if let Some(gate) = &self.me_gate {
            gate.notified().await;
        }
        let response = self.me_response.lock().unwrap().clone();
        match response {
            MeResponse::Body(body) => Ok(body),
            MeResponse::Status(status) => Err(ApiError::from_status(status, Value::Null)),
            MeResponse::Network => Err(ApiError::Network("connection refused".to_string())),
        }
    }
}

pub fn identity_json(id: i64, is_admin: bool) -> Value {
    json!({
        "id": id,
        "email": format!("user{}@example.com", id),
        "display_name": format!("user {}", id),
        "is_admin": is_admin,
    })
}

// --- Mock Events Collaborator ---

/// In-memory stand-in for the events resource. Records every payload it receives.
#[derive(Default)]
pub struct MockEventApi {
    pub events: Mutex<Vec<Event>>,
    pub received: Mutex<Vec<(Option<i64>, EventPayload)>>,
    /// Replaces the listing body when set.
    pub list_override: Mutex<Option<Value>>,
    /// Every call fails with this status when set.
    pub fail_status: Mutex<Option<u16>>,
    pub calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub tokens_seen: Mutex<Vec<Option<String>>>,
}

impl MockEventApi {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    pub fn last_payload(&self) -> EventPayload {
        self.received.lock().unwrap().last().unwrap().1.clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn enter(&self, token: Option<&str>) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(token.map(str::to_string));
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(ApiError::from_status(status, json!({"detail": "mock failure"}))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EventApi for MockEventApi {
    async fn list_events(&self, token: Option<&str>) -> Result<Value, ApiError> {
        self.enter(token)?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(body) = self.list_override.lock().unwrap().clone() {
            return Ok(body);
        }
        Ok(serde_json::to_value(&*self.events.lock().unwrap()).unwrap())
    }

    async fn get_event(&self, token: Option<&str>, id: i64) -> Result<Event, ApiError> {
        self.enter(token)?;
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn create_event(
        &self,
        token: Option<&str>,
        payload: &EventPayload,
    ) -> Result<Event, ApiError> {
        self.enter(token)?;
        self.received.lock().unwrap().push((None, payload.clone()));

        let mut events = self.events.lock().unwrap();
        let id = events.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let mut event = event(id, payload.title.as_deref().unwrap_or("untitled"), true);
        apply(&mut event, payload);
        events.push(event.clone());
        Ok(event)
    }

    async fn update_event(
        &self,
        token: Option<&str>,
        id: i64,
        payload: &EventPayload,
    ) -> Result<Event, ApiError> {
        self.enter(token)?;
        self.received.lock().unwrap().push((Some(id), payload.clone()));

        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ApiError::NotFound)?;
        apply(event, payload);
        Ok(event.clone())
    }

    async fn delete_event(&self, token: Option<&str>, id: i64) -> Result<(), ApiError> {
        self.enter(token)?;
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != id);
        if events.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

fn apply(event: &mut Event, payload: &EventPayload) {
    if let Some(title) = &payload.title {
        event.title = title.clone();
    }
    if let Some(description) = &payload.description {
        event.description = description.clone();
    }
    if let Some(location) = &payload.location {
        event.location = Some(location.clone());
    }
    if let Some(pending) = payload.pending {
        event.pending = pending;
    }
    event.updated_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
}

pub fn event(id: i64, title: &str, pending: bool) -> Event {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap();
    Event {
        id,
        title: title.to_string(),
        description: String::new(),
        start_time: at,
        end_time: at + chrono::Duration::hours(2),
        location: None,
        created_by: Some(1),
        creator_name: Some("user 1".to_string()),
        created_at: at,
        updated_at: at,
        pending,
    }
}

// --- Mock Admin Collaborator ---

#[derive(Default)]
pub struct MockAdminApi {
    pub users: Mutex<Vec<UserRecord>>,
    pub fail_status: Mutex<Option<u16>>,
}

impl MockAdminApi {
    fn check(&self) -> Result<(), ApiError> {
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(ApiError::from_status(status, Value::Null)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdminApi for MockAdminApi {
    async fn list_users(&self, _token: Option<&str>) -> Result<Vec<UserRecord>, ApiError> {
        self.check()?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn set_user_admin(
        &self,
        _token: Option<&str>,
        id: i64,
        update: AdminUpdate,
    ) -> Result<UserRecord, ApiError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id).ok_or(ApiError::NotFound)?;
        user.is_admin = update.is_admin;
        Ok(user.clone())
    }

    async fn delete_user(&self, _token: Option<&str>, id: i64) -> Result<(), ApiError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(ApiError::NotFound);
        }
        Ok(())
    }
}

// --- Session helpers ---

/// A session built on `storage` and `auth`, already hydrated.
pub async fn hydrated_session(
    storage: Arc<MockTokenStorage>,
    auth: Arc<MockAuthApi>,
) -> Arc<SessionStore> {
    let session = SessionStore::new(storage as TokenStore, auth);
    session.hydrate().await;
    session
}

pub async fn admin_session() -> Arc<SessionStore> {
    hydrated_session(
        Arc::new(MockTokenStorage::with_token("admin-token")),
        Arc::new(MockAuthApi::answering(identity_json(1, true))),
    )
    .await
}

pub async fn member_session() -> Arc<SessionStore> {
    hydrated_session(
        Arc::new(MockTokenStorage::with_token("member-token")),
        Arc::new(MockAuthApi::answering(identity_json(2, false))),
    )
    .await
}
