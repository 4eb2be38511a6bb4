use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::Mutex;

use crate::api::EventApiState;
use crate::error::ApiError;
use crate::loading::LoadingFlag;
use crate::models::{Event, EventPayload};
use crate::session::SessionStore;

/// EventCollection
///
/// The full event list plus its two derived partitions. Built in one go from a
/// fetch result; the partitions are never edited on their own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCollection {
    all: Vec<Event>,
    published: Vec<Event>,
    pending_review: Vec<Event>,
}

impl EventCollection {
    pub fn from_events(events: Vec<Event>) -> Self {
        let (pending_review, published): (Vec<Event>, Vec<Event>) =
            events.iter().cloned().partition(|e| e.pending);
        Self {
            all: events,
            published,
            pending_review,
        }
    }

    pub fn all(&self) -> &[Event] {
        &self.all
    }

    pub fn published(&self) -> &[Event] {
        &self.published
    }

    pub fn pending_review(&self) -> &[Event] {
        &self.pending_review
    }
}

/// Moderation
///
/// An explicit review decision, the only write that sets `pending` by choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Approve,
    /// Sends the event back to the review queue.
    Reject,
}

impl Moderation {
    fn pending(self) -> bool {
        matches!(self, Moderation::Reject)
    }
}

/// EventStore
///
/// Owns the event collection. Every write injects the moderation default from the
/// session (admins publish, everyone else submits for review), then re-fetches
/// the whole collection so server-computed fields are never stale.
///
/// Writes pass through a FIFO gate and therefore finish in the order they were issued.
pub struct EventStore {
    session: Arc<SessionStore>,
    api: EventApiState,
    collection: RwLock<EventCollection>,
    loading: LoadingFlag,
    write_gate: Mutex<()>,
}

impl EventStore {
    pub fn new(session: Arc<SessionStore>, api: EventApiState) -> Self {
        Self {
            session,
            api,
            collection: RwLock::new(EventCollection::default()),
            loading: LoadingFlag::new(),
            write_gate: Mutex::new(()),
        }
    }

    // --- Reads ---

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn snapshot(&self) -> EventCollection {
        self.collection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.snapshot().all
    }

    pub fn published(&self) -> Vec<Event> {
        self.snapshot().published
    }

    pub fn pending_review(&self) -> Vec<Event> {
        self.snapshot().pending_review
    }

    // --- Operations ---

    /// fetch_events
    ///
    /// Replaces the whole collection with the server's current list. A body that
    /// is not an array counts as an empty list; an item that does not parse as an
    /// event fails with `Decode` and leaves the previous collection in place.
    pub async fn fetch_events(&self) -> Result<Vec<Event>, ApiError> {
        let _loading = self.loading.begin();
        let token = self.session.token();

        let body = self
            .api
            .list_events(token.as_deref())
            .await
            .map_err(|e| self.on_error(e))?;

        let collection = EventCollection::from_events(parse_events(body)?);
        tracing::debug!(
            total = collection.all.len(),
            published = collection.published.len(),
            pending = collection.pending_review.len(),
            "event collection replaced"
        );

        let events = collection.all.clone();
        *self
            .collection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = collection;
        Ok(events)
    }

    /// Looks up one event on the server. The collection is not touched.
    pub async fn get_event(&self, id: i64) -> Result<Event, ApiError> {
        let _loading = self.loading.begin();
        let token = self.session.token();
        self.api
            .get_event(token.as_deref(), id)
            .await
            .map_err(|e| self.on_error(e))
    }

    /// create_event
    ///
    /// Submits a new event with the moderation default in place of whatever
    /// `pending` the payload carried, then re-fetches.
    pub async fn create_event(&self, payload: EventPayload) -> Result<Event, ApiError> {
        let _gate = self.write_gate.lock().await;
        let _loading = self.loading.begin();

        let payload = self.with_moderation_default(payload);
        let token = self.session.token();
        let created = self
            .api
            .create_event(token.as_deref(), &payload)
            .await
            .map_err(|e| self.on_error(e))?;
        tracing::info!(event_id = created.id, pending = created.pending, "event created");

        self.fetch_events().await?;
        Ok(created)
    }

    /// update_event
    ///
    /// Applies the same moderation default as `create_event`, on every edit: a
    /// non-admin edit sends the event back for review and an admin edit publishes it.
    // TODO: confirm with product whether routine admin edits should keep the current `pending`.
    pub async fn update_event(&self, id: i64, payload: EventPayload) -> Result<Event, ApiError> {
        let _gate = self.write_gate.lock().await;
        let _loading = self.loading.begin();

        let payload = self.with_moderation_default(payload);
        let updated = self.put(id, &payload).await?;
        tracing::info!(event_id = id, pending = updated.pending, "event updated");

        self.fetch_events().await?;
        Ok(updated)
    }

    pub async fn delete_event(&self, id: i64) -> Result<(), ApiError> {
        let _gate = self.write_gate.lock().await;
        let _loading = self.loading.begin();

        let token = self.session.token();
        self.api
            .delete_event(token.as_deref(), id)
            .await
            .map_err(|e| self.on_error(e))?;
        tracing::info!(event_id = id, "event deleted");

        self.fetch_events().await?;
        Ok(())
    }

    /// Publishes an event that is waiting for review. Admin only.
    pub async fn approve_event(&self, id: i64) -> Result<Event, ApiError> {
        self.moderate(id, Moderation::Approve).await
    }

    /// Returns an event to the review queue. Admin only.
    pub async fn reject_event(&self, id: i64) -> Result<Event, ApiError> {
        self.moderate(id, Moderation::Reject).await
    }

    /// moderate
    ///
    /// Sets `pending` explicitly instead of through the moderation default. The
    /// server replaces all fields on update, so the current event is read first
    /// and sent back whole. Fails with `Forbidden` before any request when the
    /// session identity is not an administrator.
    pub async fn moderate(&self, id: i64, decision: Moderation) -> Result<Event, ApiError> {
        if !self.session.is_admin() {
            tracing::warn!(event_id = id, ?decision, "moderation refused for non-admin session");
            return Err(ApiError::Forbidden);
        }

        let _gate = self.write_gate.lock().await;
        let _loading = self.loading.begin();

        let token = self.session.token();
        let current = self
            .api
            .get_event(token.as_deref(), id)
            .await
            .map_err(|e| self.on_error(e))?;

        let mut payload = EventPayload::from(&current);
        payload.pending = Some(decision.pending());
        let moderated = self.put(id, &payload).await?;
        tracing::info!(event_id = id, ?decision, "event moderated");

        self.fetch_events().await?;
        Ok(moderated)
    }

    // --- Helpers ---

    async fn put(&self, id: i64, payload: &EventPayload) -> Result<Event, ApiError> {
        let token = self.session.token();
        self.api
            .update_event(token.as_deref(), id, payload)
            .await
            .map_err(|e| self.on_error(e))
    }

    /// Admins publish directly, everyone else goes through review. Overrides the payload.
    fn with_moderation_default(&self, mut payload: EventPayload) -> EventPayload {
        let pending = !self.session.is_admin();
        if payload.pending.is_some_and(|requested| requested != pending) {
            tracing::debug!(pending, "overriding requested pending flag with moderation default");
        }
        payload.pending = Some(pending);
        payload
    }

    fn on_error(&self, e: ApiError) -> ApiError {
        if e.is_unauthorized() {
            self.session.handle_unauthorized();
        }
        e
    }
}

impl From<&Event> for EventPayload {
    fn from(event: &Event) -> Self {
        EventPayload {
            title: Some(event.title.clone()),
            description: Some(event.description.clone()),
            start_time: Some(event.start_time),
            end_time: Some(event.end_time),
            location: event.location.clone(),
            pending: Some(event.pending),
        }
    }
}

/// A body that is not an array is an empty listing. An array item that is not
/// an event fails the whole fetch, so the collection never silently shrinks.
fn parse_events(body: Value) -> Result<Vec<Event>, ApiError> {
    let Value::Array(items) = body else {
        tracing::warn!("event listing was not an array, treating it as empty");
        return Ok(Vec::new());
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<Event>(item).map_err(|e| {
                tracing::warn!(index, "malformed event in listing: {}", e);
                ApiError::Decode(format!("event #{}: {}", index, e))
            })
        })
        .collect()
}
