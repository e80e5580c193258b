//! Route table, session guard and the navigation shell that records where
//! the console currently is.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use shared::domain::SessionUser;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    People,
    Modules,
    Setup,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Login,
        Route::Dashboard,
        Route::People,
        Route::Modules,
        Route::Setup,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
            Route::People => "/people",
            Route::Modules => "/modules",
            Route::Setup => "/setup",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::People => "People Management",
            Route::Modules => "Module Store",
            Route::Setup => "Setup",
        }
    }

    /// Everything except the login view lives inside the authenticated layout.
    pub fn requires_session(self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    Exact(Route),
    /// Empty child path or unknown path; both land on the dashboard.
    Redirect(Route),
}

impl RouteMatch {
    pub fn target(self) -> Route {
        match self {
            RouteMatch::Exact(route) | RouteMatch::Redirect(route) => route,
        }
    }
}

pub fn resolve_path(path: &str) -> RouteMatch {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('/');

    match path {
        "login" => RouteMatch::Exact(Route::Login),
        "dashboard" => RouteMatch::Exact(Route::Dashboard),
        "people" => RouteMatch::Exact(Route::People),
        "modules" => RouteMatch::Exact(Route::Modules),
        "setup" => RouteMatch::Exact(Route::Setup),
        _ => RouteMatch::Redirect(Route::Dashboard),
    }
}

pub trait SessionState {
    fn is_authenticated(&self) -> bool;
}

impl SessionState for Option<SessionUser> {
    fn is_authenticated(&self) -> bool {
        self.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow(Route),
    RedirectToLogin,
}

pub fn guard(route: Route, session: &impl SessionState) -> GuardDecision {
    if route.requires_session() && !session.is_authenticated() {
        GuardDecision::RedirectToLogin
    } else {
        GuardDecision::Allow(route)
    }
}

/// Which outer layout wraps the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Unauthenticated,
    Authenticated,
}

pub fn shell_state(session: &impl SessionState) -> ShellState {
    if session.is_authenticated() {
        ShellState::Authenticated
    } else {
        ShellState::Unauthenticated
    }
}

/// Sink for redirects issued by components that do not own the shell,
/// such as the session store after logout.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Most recent landed routes kept by [`NavigationShell::history`].
pub const HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
struct NavigationState {
    current: Route,
    history: VecDeque<Route>,
}

#[derive(Debug)]
pub struct NavigationShell {
    state: Mutex<NavigationState>,
}

impl Default for NavigationShell {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationShell {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NavigationState {
                current: Route::Login,
                history: VecDeque::from([Route::Login]),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Route {
        self.lock().current
    }

    /// Oldest first, at most [`HISTORY_LIMIT`] entries.
    pub fn history(&self) -> Vec<Route> {
        self.lock().history.iter().copied().collect()
    }

    /// Resolves `path`, applies the session guard and records the route the
    /// console actually lands on.
    pub fn navigate(&self, path: &str, session: &impl SessionState) -> Route {
        let requested = resolve_path(path).target();
        let landed = match guard(requested, session) {
            GuardDecision::Allow(route) => route,
            GuardDecision::RedirectToLogin => {
                debug!(%requested, "no session; redirecting to login");
                Route::Login
            }
        };
        self.record(landed);
        landed
    }

    fn record(&self, route: Route) {
        let mut state = self.lock();
        state.current = route;
        if state.history.len() == HISTORY_LIMIT {
            state.history.pop_front();
        }
        state.history.push_back(route);
    }
}

impl Navigator for NavigationShell {
    fn redirect(&self, route: Route) {
        self.record(route);
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
