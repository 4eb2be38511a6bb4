use super::{Route, RouteMeta};

/// Administrator views. The server enforces the same rule on every `/admin` call;
/// this only keeps non-admins from landing on a screen that cannot load.
pub fn admin_routes() -> Vec<Route> {
    vec![Route {
        path: "/admin/users",
        name: "Users",
        meta: RouteMeta {
            requires_auth: true,
            requires_admin: true,
        },
    }]
}
