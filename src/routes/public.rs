use super::{HOME, LOGIN, REGISTER, Route, RouteMeta};

/// Public views: no requirements. The guard still keeps signed-in users away from
/// the login and registration forms.
pub fn public_routes() -> Vec<Route> {
    vec![
        Route {
            path: HOME,
            name: "Home",
            meta: RouteMeta::default(),
        },
        Route {
            path: LOGIN,
            name: "Login",
            meta: RouteMeta::default(),
        },
        Route {
            path: REGISTER,
            name: "Register",
            meta: RouteMeta::default(),
        },
        // The published listing is readable without an account.
        Route {
            path: "/events",
            name: "Events",
            meta: RouteMeta::default(),
        },
    ]
}
