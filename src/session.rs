use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::{Mutex, watch};

use crate::api::AuthApiState;
use crate::error::ApiError;
use crate::loading::LoadingFlag;
use crate::models::{AuthResponse, Identity, LoginRequest, RegisterRequest, normalize_user};
use crate::storage::TokenStore;

/// Session
///
/// Point-in-time copy of the session, handed to the navigation guard and to callers.
/// A resolved `user` always has a backing `token`; the reverse is not true while
/// the identity fetch is in flight.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<Identity>,
    pub is_hydrating: bool,
    pub is_hydrated: bool,
}

impl Session {
    /// The view of a session with no credentials at all.
    pub fn anonymous() -> Self {
        Self {
            is_hydrated: true,
            ..Self::default()
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.token, &self.user) {
            (None, _) => SessionState::Anonymous,
            (Some(_), None) => SessionState::TokenOnly,
            (Some(_), Some(_)) => SessionState::Authenticated,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// SessionState
///
/// The token/identity pair as a state machine. `TokenOnly` is transient: it only
/// exists between acquiring a token and resolving the identity behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    TokenOnly,
    Authenticated,
}

impl SessionState {
    pub fn is_settled(self) -> bool {
        !matches!(self, SessionState::TokenOnly)
    }
}

/// IdentityOutcome
///
/// What `fetch_identity` observed. The session is already updated by the time the
/// caller sees this; it only exists so callers can tell "logged out" apart from
/// "server unreachable".
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityOutcome {
    /// The identity was resolved and stored.
    Authenticated(Identity),
    /// No token was held, so nothing was requested.
    NoToken,
    /// The server refused the token (or answered with something that is not an identity).
    /// The session was cleared.
    InvalidToken,
    /// The request never got an answer. The session was cleared all the same.
    Unreachable(String),
    /// The token changed while the request was in flight; the result was discarded.
    Superseded,
}

impl IdentityOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            IdentityOutcome::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    token: Option<String>,
    user: Option<Identity>,
    is_hydrating: bool,
}

/// SessionStore
///
/// Owns the token, the resolved identity and the one-shot hydration signal.
/// Constructed once per process and shared by `Arc` with the navigation guard
/// and the event store.
pub struct SessionStore {
    inner: RwLock<Inner>,
    storage: TokenStore,
    auth: AuthApiState,
    hydrated: watch::Sender<bool>,
    hydration_started: AtomicBool,
    loading: LoadingFlag,
    // Serializes login/register so they complete in the order they were issued.
    auth_gate: Mutex<()>,
}

impl SessionStore {
    /// Creates the store with the token seeded from persisted storage, if any.
    pub fn new(storage: TokenStore, auth: AuthApiState) -> Arc<Self> {
        let token = load_persisted(&storage);
        let (hydrated, _) = watch::channel(false);

        Arc::new(Self {
            inner: RwLock::new(Inner {
                token,
                ..Inner::default()
            }),
            storage,
            auth,
            hydrated,
            hydration_started: AtomicBool::new(false),
            loading: LoadingFlag::new(),
            auth_gate: Mutex::new(()),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Reads ---

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user(&self) -> Option<Identity> {
        self.read().user.clone()
    }

    pub fn has_token(&self) -> bool {
        self.read().token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.read().user.as_ref().is_some_and(|u| u.is_admin)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn is_hydrated(&self) -> bool {
        *self.hydrated.borrow()
    }

    pub fn is_hydrating(&self) -> bool {
        self.read().is_hydrating
    }

    /// True while a login or register call is in flight.
    pub fn loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot().state()
    }

    pub fn snapshot(&self) -> Session {
        let is_hydrated = self.is_hydrated();
        let inner = self.read();
        Session {
            token: inner.token.clone(),
            user: inner.user.clone(),
            is_hydrating: inner.is_hydrating,
            is_hydrated,
        }
    }

    // --- Token choke point ---

    /// set_token
    ///
    /// The only place the token changes. Mirrors the new value into persistent
    /// storage (write on `Some`, delete on `None`) while holding the state lock,
    /// so memory and storage always end on the same value.
    ///
    /// Dropping the token, or replacing it with a different one, also drops the
    /// identity that belonged to the old token.
    pub fn set_token(&self, token: Option<String>) {
        let mut inner = self.write();
        self.replace_token(&mut inner, token);
    }

    // Storage I/O is synchronous and runs under the write lock: it is one small
    // value, and concurrent set_token calls must reach storage in lock order.
    fn replace_token(&self, inner: &mut Inner, token: Option<String>) {
        if inner.token != token {
            inner.user = None;
        }

        let persisted = match &token {
            Some(t) => self.storage.store(t),
            None => self.storage.clear(),
        };
        if let Err(e) = persisted {
            tracing::warn!("failed to mirror session token into storage: {}", e);
        }

        match &token {
            Some(_) => tracing::debug!("session token set"),
            None => tracing::debug!("session token cleared"),
        }
        inner.token = token;
    }

    /// Clears token and identity. Safe to call repeatedly.
    pub fn logout(&self) {
        self.set_token(None);
        tracing::info!("session logged out");
    }

    /// Ends the session after any API call answered 401.
    pub fn handle_unauthorized(&self) {
        if self.has_token() {
            tracing::warn!("API rejected the session token, logging out");
        }
        self.logout();
    }

    // --- Identity ---

    /// fetch_identity
    ///
    /// Resolves the identity behind the current token. Never fails: a refused
    /// token or a network error both clear the session, and the outcome says which.
    /// A response for a token that has since been replaced or cleared is ignored.
    pub async fn fetch_identity(&self) -> IdentityOutcome {
        let Some(token) = self.token() else {
            return IdentityOutcome::NoToken;
        };

        let result = self.auth.me(&token).await;

        if self.read().token.as_deref() != Some(token.as_str()) {
            tracing::debug!("discarding identity response for a superseded token");
            return IdentityOutcome::Superseded;
        }

        match result {
            Ok(body) => match normalize_user(&body) {
                Some(identity) => {
                    tracing::info!(
                        user_id = ?identity.id,
                        is_admin = identity.is_admin,
                        "session identity resolved"
                    );
                    self.store_identity(&token, identity.clone());
                    IdentityOutcome::Authenticated(identity)
                }
                None => {
                    tracing::warn!("identity endpoint returned no usable identity");
                    self.clear_if_current(&token);
                    IdentityOutcome::InvalidToken
                }
            },
            Err(e @ (ApiError::Unauthorized | ApiError::Forbidden)) => {
                tracing::info!("identity fetch refused: {}", e);
                self.clear_if_current(&token);
                IdentityOutcome::InvalidToken
            }
            Err(e) => {
                tracing::warn!("identity fetch failed: {}", e);
                self.clear_if_current(&token);
                IdentityOutcome::Unreachable(e.to_string())
            }
        }
    }

    fn store_identity(&self, token: &str, identity: Identity) {
        let mut inner = self.write();
        // Re-checked under the write lock: a logout may have landed in between.
        if inner.token.as_deref() == Some(token) {
            inner.user = Some(identity);
        }
    }

    fn clear_if_current(&self, token: &str) {
        let mut inner = self.write();
        if inner.token.as_deref() == Some(token) {
            self.replace_token(&mut inner, None);
            tracing::info!("session cleared after failed identity fetch");
        }
    }

    // --- Login / Register ---

    /// login
    ///
    /// Exchanges credentials for a token. On a response carrying `access_token`
    /// the token is stored and the identity fetched before returning. The raw
    /// response, or the failure, goes back to the caller either way.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let _gate = self.auth_gate.lock().await;
        let _loading = self.loading.begin();

        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let res = self.auth.login(&req).await;
        self.accept_auth_response(res).await
    }

    /// register
    ///
    /// Same flow as `login`. Backends that answer registration without a token
    /// leave the session untouched.
    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let _gate = self.auth_gate.lock().await;
        let _loading = self.loading.begin();

        let req = RegisterRequest {
            email: email.to_string(),
            display_name: display_name.to_string(),
            password: password.to_string(),
        };
        let res = self.auth.register(&req).await;
        self.accept_auth_response(res).await
    }

    async fn accept_auth_response(
        &self,
        res: Result<AuthResponse, ApiError>,
    ) -> Result<AuthResponse, ApiError> {
        let res = match res {
            Ok(res) => res,
            Err(e) => {
                if e.is_unauthorized() {
                    self.handle_unauthorized();
                }
                return Err(e);
            }
        };

        if let Some(token) = res.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.set_token(Some(token.to_string()));
            self.fetch_identity().await;
        } else {
            tracing::debug!("auth response carried no access token");
        }
        Ok(res)
    }

    // --- Hydration ---

    /// init
    ///
    /// Returns immediately. Without a persisted token the session is hydrated
    /// before this returns; with one, hydration continues in the background.
    /// Must be called from within a tokio runtime. Only the first call does any work.
    pub fn init(self: &Arc<Self>) {
        if self.is_hydrated() || self.hydration_started.load(Ordering::SeqCst) {
            return;
        }

        if load_persisted(&self.storage).is_none() {
            if !self.hydration_started.swap(true, Ordering::SeqCst) {
                tracing::debug!("no persisted token, session hydrated as anonymous");
                self.mark_hydrated();
            }
            return;
        }

        let store = Arc::clone(self);
        tokio::spawn(async move {
            store.hydrate().await;
        });
    }

    /// hydrate
    ///
    /// Rebuilds the session from the persisted token. Without a token this marks
    /// the session hydrated straight away and makes no network call; with one it
    /// resolves the identity first. Either way `is_hydrated` ends up true.
    /// A second caller just waits for the first pass to finish.
    pub async fn hydrate(&self) {
        if self.hydration_started.swap(true, Ordering::SeqCst) {
            self.wait_hydrated().await;
            return;
        }

        let Some(token) = load_persisted(&self.storage) else {
            tracing::debug!("no persisted token, session hydrated as anonymous");
            self.mark_hydrated();
            return;
        };

        {
            // Already persisted, so this bypasses set_token on purpose.
            let mut inner = self.write();
            if inner.token.as_deref() != Some(token.as_str()) {
                inner.user = None;
            }
            inner.token = Some(token);
            inner.is_hydrating = true;
        }
        tracing::info!("hydrating session from persisted token");

        let outcome = self.fetch_identity().await;
        tracing::debug!(?outcome, "hydration identity fetch settled");
        self.mark_hydrated();
    }

    fn mark_hydrated(&self) {
        self.write().is_hydrating = false;
        let flipped = self.hydrated.send_if_modified(|hydrated| {
            if *hydrated {
                false
            } else {
                *hydrated = true;
                true
            }
        });
        if flipped {
            tracing::info!(state = ?self.state(), "session hydrated");
        }
    }

    /// Resolves once hydration has completed; immediately if it already has.
    pub async fn wait_hydrated(&self) {
        let mut rx = self.hydrated.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }

    /// A receiver for the hydration flag, for callers that want to select on it.
    pub fn subscribe_hydration(&self) -> watch::Receiver<bool> {
        self.hydrated.subscribe()
    }
}

fn load_persisted(storage: &TokenStore) -> Option<String> {
    match storage.load() {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("could not read persisted token, starting anonymous: {}", e);
            None
        }
    }
}
