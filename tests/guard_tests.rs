mod common;

use common::{MockAuthApi, identity_json};
use eventboard_client::{
    Navigation, NavigationGuard, RouteTable, SessionStore,
    storage::{MockTokenStorage, TokenStore},
};
use std::{sync::Arc, time::Duration};
use tokio::sync::Notify;

fn guard_for(session: &Arc<SessionStore>, timeout: Option<Duration>) -> NavigationGuard {
    NavigationGuard::new(session.clone(), RouteTable::default(), timeout)
}

fn session_with(token: Option<&str>, auth: MockAuthApi) -> Arc<SessionStore> {
    let storage = match token {
        Some(t) => MockTokenStorage::with_token(t),
        None => MockTokenStorage::new(),
    };
    SessionStore::new(Arc::new(storage) as TokenStore, Arc::new(auth))
}

fn redirect(to: &'static str) -> Navigation {
    Navigation::Redirect { to, replace: true }
}

#[tokio::test]
async fn test_anonymous_admin_navigation_redirects_to_login() {
    let session = session_with(None, MockAuthApi::answering(identity_json(1, false)));
    session.hydrate().await;
    let guard = guard_for(&session, None);

    assert_eq!(guard.resolve("/admin/users").await, redirect("/login"));
}

#[tokio::test]
async fn test_member_may_open_create_event_but_not_admin_views() {
    let session = session_with(Some("t"), MockAuthApi::answering(identity_json(2, false)));
    session.hydrate().await;
    let guard = guard_for(&session, None);

    assert_eq!(guard.resolve("/create-event").await, Navigation::Proceed);
    assert_eq!(guard.resolve("/admin/users").await, redirect("/"));
    assert_eq!(guard.resolve("/events").await, Navigation::Proceed);
}

#[tokio::test]
async fn test_admin_may_open_admin_views() {
    let session = session_with(Some("t"), MockAuthApi::answering(identity_json(1, true)));
    session.hydrate().await;
    let guard = guard_for(&session, None);

    assert_eq!(guard.resolve("/admin/users").await, Navigation::Proceed);
    assert_eq!(guard.resolve("/admin/users/").await, Navigation::Proceed);
}

#[tokio::test]
async fn test_auth_forms_redirect_home_while_token_held() {
    let session = session_with(Some("t"), MockAuthApi::answering(identity_json(2, false)));
    session.hydrate().await;
    let guard = guard_for(&session, None);

    assert_eq!(guard.resolve("/login").await, redirect("/"));
    assert_eq!(guard.resolve("/register?next=/events").await, redirect("/"));

    session.logout();
    assert_eq!(guard.resolve("/login").await, Navigation::Proceed);
}

#[tokio::test]
async fn test_unknown_paths_proceed() {
    let session = session_with(None, MockAuthApi::answering(identity_json(1, false)));
    session.hydrate().await;
    let guard = guard_for(&session, None);

    assert_eq!(guard.resolve("/nowhere").await, Navigation::Proceed);
}

#[tokio::test]
async fn test_navigation_waits_for_hydration_before_deciding() {
    let gate = Arc::new(Notify::new());
    let session = session_with(
        Some("t"),
        MockAuthApi::answering(identity_json(1, true)).gated(gate.clone()),
    );
    session.init();
    let guard = Arc::new(guard_for(&session, None));

    let pending = {
        let guard = guard.clone();
        tokio::spawn(async move { guard.resolve("/admin/users").await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!pending.is_finished(), "guard decided before hydration finished");

    gate.notify_one();
    let decision = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .expect("guard should resume after hydration")
        .unwrap();

    // A hard refresh on an admin view keeps the admin there.
    assert_eq!(decision, Navigation::Proceed);
}

#[tokio::test]
async fn test_failed_hydration_releases_waiting_navigation_to_login() {
    let gate = Arc::new(Notify::new());
    let session = session_with(Some("expired"), MockAuthApi::failing(401).gated(gate.clone()));
    session.init();
    let guard = Arc::new(guard_for(&session, None));

    let pending = {
        let guard = guard.clone();
        tokio::spawn(async move { guard.resolve("/create-event").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    gate.notify_one();

    let decision = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .expect("guard should resume after hydration")
        .unwrap();

    assert_eq!(decision, redirect("/login"));
    assert_eq!(session.token(), None);
    assert_eq!(session.user(), None);
}

#[tokio::test]
async fn test_hydration_wait_is_bounded() {
    let gate = Arc::new(Notify::new());
    let session = session_with(
        Some("t"),
        MockAuthApi::answering(identity_json(1, true)).gated(gate.clone()),
    );
    session.init();
    let guard = guard_for(&session, Some(Duration::from_millis(50)));

    let decision = tokio::time::timeout(Duration::from_secs(1), guard.resolve("/create-event"))
        .await
        .expect("bounded wait should not hang");

    assert_eq!(decision, redirect("/login"));
    // The session itself is not touched by the fallback.
    assert!(!session.is_hydrated());
    assert_eq!(session.token().as_deref(), Some("t"));

    gate.notify_one();
    session.wait_hydrated().await;
    assert_eq!(guard.resolve("/create-event").await, Navigation::Proceed);
}
