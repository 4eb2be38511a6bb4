/// Route Table
///
/// The client's views grouped by who may reach them. The navigation guard reads
/// the `RouteMeta` of the target; everything else about a route is display glue.

/// Views reachable by anyone, including the login and registration forms.
pub mod public;

/// Views that need a session token.
pub mod authenticated;

/// Views that need an administrator identity.
pub mod admin;

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";
pub const REGISTER: &str = "/register";

/// RouteMeta
///
/// Access requirements attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub meta: RouteMeta,
}

impl Route {
    /// True for the login and registration forms.
    pub fn is_auth_form(&self) -> bool {
        self.path == LOGIN || self.path == REGISTER
    }
}

/// RouteTable
///
/// Lookup from path to route. Unknown paths resolve to `None` and carry no requirements.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        let mut routes = public::public_routes();
        routes.extend(authenticated::authenticated_routes());
        routes.extend(admin::admin_routes());
        Self { routes }
    }
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Finds the route for `path`, ignoring a query string, a fragment and a trailing slash.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let trimmed = match path.trim_end_matches('/') {
            "" => HOME,
            p => p,
        };
        self.routes.iter().find(|r| r.path == trimmed)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
