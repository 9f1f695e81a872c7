use log::info;
use crate::api::student::StudentApi;
use crate::api::Api;
use crate::controllers::{require_admin, Action, ControllerError, MountGuard, Screen, ScreenState};
use crate::models::Student;
use crate::session::SessionStore;
use crate::validation::StudentForm;

// Student records are an admin-only screen; every action checks the role first.
pub struct StudentsController {
    api: StudentApi,
    session: SessionStore,
    screen: Screen<Student>,
}

impl StudentsController {
    pub fn new(api: &Api, session: SessionStore) -> Self {
        StudentsController { api: api.students.clone(), session, screen: Screen::new() }
    }

    pub fn state(&self) -> ScreenState<Student> {
        self.screen.snapshot()
    }

    pub fn guard(&self) -> &MountGuard {
        self.screen.guard()
    }

    pub fn unmount(&self) {
        self.screen.guard().unmount();
    }

    pub async fn mount(&self) -> Result<(), ControllerError> {
        self.screen.guard().ensure_mounted();
        require_admin(&self.session, &self.screen)?;
        self.screen.load(self.api.list()).await?;
        info!("Loaded {} students", self.screen.items().len());
        Ok(())
    }

    pub async fn show(&self, id: i64) -> Result<Student, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen.apply(self.api.get(id), |_| None, "Student loaded").await
    }

    pub async fn show_by_student_id(&self, student_id: &str) -> Result<Student, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen.apply(self.api.by_student_id(student_id), |_| None, "Student loaded").await
    }

    /// Replaces the visible list with the search result. An empty keyword reloads everything.
    pub async fn search(&self, keyword: &str) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.screen.load(self.api.list()).await;
        }
        self.screen.load(self.api.search(keyword)).await
    }

    pub async fn by_department(&self, department: &str) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen.load(self.api.by_department(department.trim())).await
    }

    pub async fn create(&self, form: &StudentForm) -> Result<Student, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let request = form.validate().map_err(|errors| self.screen.reject(errors))?;
        let student = self
            .screen
            .apply(self.api.create(&request), |s: &Student| Some(Action::Add(s.clone())), "Student created")
            .await?;
        info!("Created student {} ({})", student.student_id, student.id);
        Ok(student)
    }

    pub async fn update(&self, id: i64, form: &StudentForm) -> Result<Student, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let request = form.validate().map_err(|errors| self.screen.reject(errors))?;
        self.screen
            .apply(self.api.update(id, &request), |s: &Student| Some(Action::Update(s.clone())), "Student updated")
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen
            .apply(self.api.delete(id), |_| Some(Action::Delete(id)), "Student deleted")
            .await
    }
}
