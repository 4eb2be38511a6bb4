use std::sync::Arc;

// --- Module Structure ---

// Core stores and the navigation guard.
pub mod session;
pub mod guard;
pub mod events;
pub mod admin;

// Collaborators, persistence and shared types.
pub mod api;
pub mod storage;
pub mod models;
pub mod error;
pub mod config;
pub mod loading;

// Route table, split by access level (Public, Authenticated, Admin).
pub mod routes;

// --- Public Re-exports ---

pub use admin::AdminDirectory;
pub use api::{AdminApi, AuthApi, EventApi, HttpApiClient};
pub use config::{ClientConfig, Env};
pub use error::{ApiError, StorageError};
pub use events::{EventCollection, EventStore, Moderation};
pub use guard::{Navigation, NavigationGuard};
pub use routes::RouteTable;
pub use session::{IdentityOutcome, Session, SessionState, SessionStore};
pub use storage::{FileTokenStorage, MockTokenStorage, TokenStore};

/// ClientState
///
/// The wired-up client: one session shared by reference with the guard and the
/// stores that consult it. Built once at startup and passed around explicitly.
#[derive(Clone)]
pub struct ClientState {
    pub session: Arc<SessionStore>,
    pub guard: Arc<NavigationGuard>,
    pub events: Arc<EventStore>,
    pub admin: Arc<AdminDirectory>,
    pub config: ClientConfig,
}

impl ClientState {
    /// Assembles the components around the given collaborators. Does not start hydration.
    pub fn new(
        config: ClientConfig,
        storage: TokenStore,
        auth: api::AuthApiState,
        event_api: api::EventApiState,
        admin_api: api::AdminApiState,
    ) -> Self {
        let session = SessionStore::new(storage, auth);
        let guard = NavigationGuard::new(
            Arc::clone(&session),
            RouteTable::default(),
            config.hydration_timeout,
        );
        let events = EventStore::new(Arc::clone(&session), event_api);
        let admin = AdminDirectory::new(Arc::clone(&session), admin_api);

        Self {
            session,
            guard: Arc::new(guard),
            events: Arc::new(events),
            admin: Arc::new(admin),
            config,
        }
    }
}

/// bootstrap
///
/// Builds the HTTP client and file-backed token storage from `config`, wires the
/// components, and starts session hydration in the background.
/// Must be called from within a tokio runtime.
pub fn bootstrap(config: ClientConfig) -> Result<ClientState, ApiError> {
    let http = Arc::new(HttpApiClient::new(&config)?);
    let storage = Arc::new(FileTokenStorage::new(config.token_store_path.clone())) as TokenStore;

    let state = ClientState::new(
        config,
        storage,
        http.clone(),
        http.clone(),
        http,
    );
    state.session.init();
    Ok(state)
}
