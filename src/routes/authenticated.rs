use super::{Route, RouteMeta};

/// Views for any signed-in user. Events submitted from here by non-admins land
/// in the review queue.
pub fn authenticated_routes() -> Vec<Route> {
    vec![Route {
        path: "/create-event",
        name: "CreateEvent",
        meta: RouteMeta {
            requires_auth: true,
            requires_admin: false,
        },
    }]
}
