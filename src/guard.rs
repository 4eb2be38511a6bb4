use std::sync::Arc;
use std::time::Duration;

use crate::routes::{HOME, LOGIN, Route, RouteTable};
use crate::session::{Session, SessionStore};

/// Navigation
///
/// The guard's verdict for one attempted navigation. Redirects always replace the
/// current history entry so the back button cannot loop through a rejected view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect { to: &'static str, replace: bool },
}

impl Navigation {
    fn replace_with(to: &'static str) -> Self {
        Navigation::Redirect { to, replace: true }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Navigation::Proceed)
    }
}

/// NavigationGuard
///
/// Decides, per navigation, whether to proceed or redirect. While the session is
/// still hydrating the decision is held back until the hydration signal fires,
/// so a hard refresh on a protected view does not bounce a signed-in user to
/// the login form.
pub struct NavigationGuard {
    session: Arc<SessionStore>,
    routes: RouteTable,
    hydration_timeout: Option<Duration>,
}

impl NavigationGuard {
    pub fn new(
        session: Arc<SessionStore>,
        routes: RouteTable,
        hydration_timeout: Option<Duration>,
    ) -> Self {
        Self {
            session,
            routes,
            hydration_timeout,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// resolve
    ///
    /// Waits for hydration if needed, then evaluates `path`. If the wait exceeds
    /// the configured bound the navigation is judged as anonymous; the session
    /// itself is left alone and later navigations see the real state.
    pub async fn resolve(&self, path: &str) -> Navigation {
        let session = self.settled_session().await;
        let decision = match self.routes.resolve(path) {
            Some(route) => evaluate(route, &session),
            None => Navigation::Proceed,
        };

        if let Navigation::Redirect { to, .. } = &decision {
            tracing::info!(from = path, to = *to, "navigation redirected");
        } else {
            tracing::debug!(path, "navigation allowed");
        }
        decision
    }

    async fn settled_session(&self) -> Session {
        if self.session.is_hydrated() {
            return self.session.snapshot();
        }

        tracing::debug!("navigation waiting for session hydration");
        match self.hydration_timeout {
            None => {
                self.session.wait_hydrated().await;
                self.session.snapshot()
            }
            Some(limit) => {
                match tokio::time::timeout(limit, self.session.wait_hydrated()).await {
                    Ok(()) => self.session.snapshot(),
                    Err(_) => {
                        tracing::warn!(
                            timeout_ms = limit.as_millis() as u64,
                            "session hydration did not settle in time, treating navigation as anonymous"
                        );
                        Session::anonymous()
                    }
                }
            }
        }
    }
}

/// evaluate
///
/// The routing rules against an already-settled session, first match wins:
/// protected route without a token goes to login, admin route without an admin
/// identity goes home, auth forms with a token go home, anything else proceeds.
pub fn evaluate(route: &Route, session: &Session) -> Navigation {
    if route.meta.requires_auth && session.token.is_none() {
        return Navigation::replace_with(LOGIN);
    }

    if route.meta.requires_admin && !session.is_admin() {
        return Navigation::replace_with(HOME);
    }

    if route.is_auth_form() && session.token.is_some() {
        return Navigation::replace_with(HOME);
    }

    Navigation::Proceed
}
