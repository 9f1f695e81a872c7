use std::fmt;
use std::sync::{Arc, Mutex};
use log::debug;
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Courses,
    Students,
    Enrollments,
    Grades,
    MyResults,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Courses => "/courses",
            Route::Students => "/students",
            Route::Enrollments => "/enrollments",
            Route::Grades => "/grades",
            Route::MyResults => "/my-results",
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Students | Route::Grades)
    }

    /// Where a freshly logged-in user lands.
    pub fn home(role: Role) -> Route {
        match role {
            Role::Admin => Route::Dashboard,
            Role::Student => Route::MyResults,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Shared handle on the current client-side route.
#[derive(Clone)]
pub struct Navigator {
    current: Arc<Mutex<Route>>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Navigator { current: Arc::new(Mutex::new(start)) }
    }

    pub fn current(&self) -> Route {
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn redirect(&self, route: Route) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current != route {
            debug!("Navigating from {} to {}", *current, route);
            *current = route;
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Navigator::new(Route::Login)
    }
}
