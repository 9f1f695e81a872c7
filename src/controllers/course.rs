use std::sync::{Arc, Mutex};
use log::info;
use crate::api::course::CourseApi;
use crate::api::Api;
use crate::controllers::{require_admin, Action, ControllerError, MountGuard, Screen, ScreenState};
use crate::models::Course;
use crate::session::SessionStore;
use crate::validation::CourseForm;

pub struct CoursesController {
    api: CourseApi,
    session: SessionStore,
    screen: Screen<Course>,
    selected: Arc<Mutex<Option<Course>>>,
}

impl CoursesController {
    pub fn new(api: &Api, session: SessionStore) -> Self {
        CoursesController {
            api: api.courses.clone(),
            session,
            screen: Screen::new(),
            selected: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> ScreenState<Course> {
        self.screen.snapshot()
    }

    pub fn guard(&self) -> &MountGuard {
        self.screen.guard()
    }

    pub fn unmount(&self) {
        self.screen.guard().unmount();
    }

    pub fn selected(&self) -> Option<Course> {
        self.selected.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub async fn mount(&self) -> Result<(), ControllerError> {
        self.screen.guard().ensure_mounted();
        self.screen.load(self.api.list()).await?;
        info!("Loaded {} courses", self.screen.items().len());
        Ok(())
    }

    // Student view: only courses still open for self-enrollment.
    pub async fn mount_available(&self) -> Result<(), ControllerError> {
        self.screen.guard().ensure_mounted();
        self.screen.load(self.api.available()).await
    }

    pub async fn select(&self, id: i64) -> Result<Course, ControllerError> {
        let ticket = self.screen.guard().ticket();
        let course = self.screen.apply(self.api.get(id), |_| None, "Course loaded").await?;
        if self.screen.guard().is_live(ticket) {
            *self.selected.lock().unwrap_or_else(|p| p.into_inner()) = Some(course.clone());
        }
        Ok(course)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Course, ControllerError> {
        self.screen.apply(self.api.by_code(code), |_| None, "Course loaded").await
    }

    pub async fn create(&self, form: &CourseForm) -> Result<Course, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let request = form.validate().map_err(|errors| self.screen.reject(errors))?;
        let course = self
            .screen
            .apply(self.api.create(&request), |c: &Course| Some(Action::Add(c.clone())), "Course created")
            .await?;
        info!("Created course {} ({})", course.code, course.id);
        Ok(course)
    }

    pub async fn update(&self, id: i64, form: &CourseForm) -> Result<Course, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let request = form.validate().map_err(|errors| self.screen.reject(errors))?;
        self.screen
            .apply(self.api.update(id, &request), |c: &Course| Some(Action::Update(c.clone())), "Course updated")
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen
            .apply(self.api.delete(id), |_| Some(Action::Delete(id)), "Course deleted")
            .await?;
        info!("Deleted course {}", id);
        Ok(())
    }
}
