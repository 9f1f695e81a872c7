use std::sync::{Arc, Mutex, MutexGuard};
use log::info;
use crate::api::enrollment::EnrollmentApi;
use crate::api::grade::GradeApi;
use crate::api::Api;
use crate::controllers::{require_admin, require_student, Action, ControllerError, MountGuard, Screen, ScreenState};
use crate::models::{Enrollment, Grade};
use crate::session::SessionStore;
use crate::validation::GradeForm;

#[derive(Debug, Clone, Default, PartialEq)]
struct GradeExtras {
    enrollments: Vec<Enrollment>,
    my_average: Option<f64>,
}

pub struct GradesController {
    grades: GradeApi,
    enrollments: EnrollmentApi,
    session: SessionStore,
    screen: Screen<Grade>,
    extras: Arc<Mutex<GradeExtras>>,
}

impl GradesController {
    pub fn new(api: &Api, session: SessionStore) -> Self {
        GradesController {
            grades: api.grades.clone(),
            enrollments: api.enrollments.clone(),
            session,
            screen: Screen::new(),
            extras: Arc::new(Mutex::new(GradeExtras::default())),
        }
    }

    fn lock_extras(&self) -> MutexGuard<'_, GradeExtras> {
        self.extras.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> ScreenState<Grade> {
        self.screen.snapshot()
    }

    // Enrollments the grade form can attach a grade to.
    pub fn enrollments(&self) -> Vec<Enrollment> {
        self.lock_extras().enrollments.clone()
    }

    pub fn my_average(&self) -> Option<f64> {
        self.lock_extras().my_average
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
        let ticket = self.screen.begin();
        match tokio::try_join!(self.grades.list(), self.enrollments.list()) {
            Ok((grades, enrollments)) => {
                let count = grades.len();
                if self.screen.dispatch(ticket, Action::SetItems(grades)) {
                    self.lock_extras().enrollments = enrollments;
                    info!("Loaded {} grades", count);
                }
                Ok(())
            }
            Err(err) => {
                self.screen.dispatch(ticket, Action::SetError(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// The student's own results page: their grades and overall average.
    pub async fn mount_mine(&self) -> Result<(), ControllerError> {
        self.screen.guard().ensure_mounted();
        require_student(&self.session, &self.screen)?;
        let ticket = self.screen.begin();
        match tokio::try_join!(self.grades.mine(), self.grades.my_average()) {
            Ok((grades, average)) => {
                if self.screen.dispatch(ticket, Action::SetItems(grades)) {
                    self.lock_extras().my_average = Some(average);
                }
                Ok(())
            }
            Err(err) => {
                self.screen.dispatch(ticket, Action::SetError(err.to_string()));
                Err(err.into())
            }
        }
    }

    pub async fn mine_for_course(&self, course_id: i64) -> Result<(), ControllerError> {
        require_student(&self.session, &self.screen)?;
        self.screen.load(self.grades.mine_for_course(course_id)).await
    }

    pub async fn for_enrollment(&self, enrollment_id: i64) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen.load(self.grades.by_enrollment(enrollment_id)).await
    }

    pub async fn for_student(&self, student_id: i64) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen.load(self.grades.by_student(student_id)).await
    }

    pub async fn for_course(&self, course_id: i64) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen.load(self.grades.by_course(course_id)).await
    }

    pub async fn show(&self, id: i64) -> Result<Grade, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen.apply(self.grades.get(id), |_| None, "Grade loaded").await
    }

    pub async fn create(&self, form: &GradeForm) -> Result<Grade, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let request = form.validate().map_err(|errors| self.screen.reject(errors))?;
        let grade = self
            .screen
            .apply(self.grades.create(&request), |g: &Grade| Some(Action::Add(g.clone())), "Grade created")
            .await?;
        info!("Created grade {} for enrollment {}", grade.id, request.enrollment_id);
        Ok(grade)
    }

    pub async fn update(&self, id: i64, form: &GradeForm) -> Result<Grade, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let request = form.validate().map_err(|errors| self.screen.reject(errors))?;
        self.screen
            .apply(self.grades.update(id, &request), |g: &Grade| Some(Action::Update(g.clone())), "Grade updated")
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen
            .apply(self.grades.delete(id), |_| Some(Action::Delete(id)), "Grade deleted")
            .await
    }

    pub async fn student_average(&self, student_id: i64) -> Result<f64, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let avg = self.grades.average_for_student(student_id);
        self.screen.apply(avg, |_| None, "Average for student computed").await
    }

    pub async fn course_average(&self, course_id: i64) -> Result<f64, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let avg = self.grades.average_for_course(course_id);
        self.screen.apply(avg, |_| None, "Average for course computed").await
    }
}
