use std::sync::Arc;
use anyhow::{Context, Result};
use log::debug;
use crate::api::Api;
use crate::config::Config;
use crate::controllers::{
    CoursesController, DashboardController, EnrollmentsController, GradesController, StudentsController,
};
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;
use crate::utils::http::HttpClient;
use crate::utils::storage::{FileStorage, Storage};

/// Everything a screen needs: the session, the typed API and the router.
pub struct App {
    pub session: SessionStore,
    pub api: Api,
}

impl App {
    // Opens the persisted state file and restores any stored session.
    pub fn connect(config: &Config) -> Result<Self> {
        let storage = FileStorage::open(&config.state_file)
            .with_context(|| format!("Failed to open state file {}", config.state_file.display()))?;
        debug!("Using state file {}", storage.path().display());
        Self::with_storage(config, Arc::new(storage))
    }

    pub fn with_storage(config: &Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let navigator = Navigator::new(Route::Login);
        let session = SessionStore::rehydrate(storage, navigator);
        if let Some(role) = session.role().filter(|_| session.is_authenticated()) {
            session.navigator().redirect(Route::home(role));
        }
        let http = HttpClient::new(config, session.clone())?;
        Ok(App { session, api: Api::new(http) })
    }

    pub fn navigator(&self) -> &Navigator {
        self.session.navigator()
    }

    pub fn courses(&self) -> CoursesController {
        CoursesController::new(&self.api, self.session.clone())
    }

    pub fn students(&self) -> StudentsController {
        StudentsController::new(&self.api, self.session.clone())
    }

    pub fn enrollments(&self) -> EnrollmentsController {
        EnrollmentsController::new(&self.api, self.session.clone())
    }

    pub fn grades(&self) -> GradesController {
        GradesController::new(&self.api, self.session.clone())
    }

    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(&self.api, self.session.clone())
    }
}
