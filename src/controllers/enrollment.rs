use std::sync::{Arc, Mutex, MutexGuard};
use log::info;
use crate::api::course::CourseApi;
use crate::api::enrollment::EnrollmentApi;
use crate::api::student::StudentApi;
use crate::api::Api;
use crate::controllers::{require_admin, require_student, Action, ControllerError, MountGuard, Screen, ScreenState};
use crate::error::ApiError;
use crate::models::{Course, Enrollment, EnrollmentCheck, EnrollmentStatus, Student};
use crate::session::SessionStore;
use crate::validation::EnrollmentForm;

// Pick lists for the enrollment form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentLookups {
    pub courses: Vec<Course>,
    pub students: Vec<Student>,
}

pub struct EnrollmentsController {
    enrollments: EnrollmentApi,
    courses: CourseApi,
    students: StudentApi,
    session: SessionStore,
    screen: Screen<Enrollment>,
    lookups: Arc<Mutex<EnrollmentLookups>>,
}

impl EnrollmentsController {
    pub fn new(api: &Api, session: SessionStore) -> Self {
        EnrollmentsController {
            enrollments: api.enrollments.clone(),
            courses: api.courses.clone(),
            students: api.students.clone(),
            session,
            screen: Screen::new(),
            lookups: Arc::new(Mutex::new(EnrollmentLookups::default())),
        }
    }

    pub fn state(&self) -> ScreenState<Enrollment> {
        self.screen.snapshot()
    }

    pub fn lookups(&self) -> EnrollmentLookups {
        self.lock_lookups().clone()
    }

    fn lock_lookups(&self) -> MutexGuard<'_, EnrollmentLookups> {
        self.lookups.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn guard(&self) -> &MountGuard {
        self.screen.guard()
    }

    pub fn unmount(&self) {
        self.screen.guard().unmount();
    }

    /// Admins see every enrollment plus the course and student pick lists; students
    /// see their own enrollments and the courses still open to them.
    pub async fn mount(&self) -> Result<(), ControllerError> {
        self.screen.guard().ensure_mounted();
        let ticket = self.screen.begin();

        let fetched: Result<(Vec<Enrollment>, EnrollmentLookups), ApiError> = if self.session.is_admin() {
            tokio::try_join!(self.enrollments.list(), self.courses.list(), self.students.list())
                .map(|(enrollments, courses, students)| (enrollments, EnrollmentLookups { courses, students }))
        } else {
            tokio::try_join!(self.enrollments.mine(), self.courses.available())
                .map(|(enrollments, courses)| (enrollments, EnrollmentLookups { courses, students: Vec::new() }))
        };

        match fetched {
            Ok((enrollments, lookups)) => {
                let count = enrollments.len();
                if self.screen.dispatch(ticket, Action::SetItems(enrollments)) {
                    *self.lock_lookups() = lookups;
                    info!("Loaded {} enrollments", count);
                }
                Ok(())
            }
            Err(err) => {
                self.screen.dispatch(ticket, Action::SetError(err.to_string()));
                Err(err.into())
            }
        }
    }

    pub async fn show(&self, id: i64) -> Result<Enrollment, ControllerError> {
        self.screen.apply(self.enrollments.get(id), |_| None, "Enrollment loaded").await
    }

    pub async fn create(&self, form: &EnrollmentForm) -> Result<Enrollment, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let request = form.validate().map_err(|errors| self.screen.reject(errors))?;
        let enrollment = self
            .screen
            .apply(
                self.enrollments.create(&request),
                |e: &Enrollment| Some(Action::Add(e.clone())),
                "Enrollment created successfully!",
            )
            .await?;
        info!("Enrolled student {} in course {}", enrollment.student.student_id, enrollment.course.code);
        Ok(enrollment)
    }

    pub async fn self_enroll(&self, course_id: i64) -> Result<Enrollment, ControllerError> {
        require_student(&self.session, &self.screen)?;
        let ticket = self.screen.guard().ticket();
        let enrollment = self
            .screen
            .apply(
                self.enrollments.self_enroll(course_id),
                |e: &Enrollment| Some(Action::Add(e.clone())),
                "Successfully enrolled in course!",
            )
            .await?;
        // The course is no longer on offer to this student.
        if self.screen.guard().is_live(ticket) {
            self.lock_lookups().courses.retain(|c| c.id != course_id);
        }
        Ok(enrollment)
    }

    pub async fn check(&self, course_id: i64) -> Result<EnrollmentCheck, ControllerError> {
        self.screen
            .apply(self.enrollments.status_for_course(course_id), |_| None, "Enrollment status checked")
            .await
    }

    pub async fn update_status(&self, id: i64, status: EnrollmentStatus) -> Result<Enrollment, ControllerError> {
        require_admin(&self.session, &self.screen)?;
        let notice = format!("Enrollment status updated to {}", status);
        self.screen
            .apply(
                self.enrollments.update_status(id, status),
                |e: &Enrollment| Some(Action::Update(e.clone())),
                &notice,
            )
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ControllerError> {
        require_admin(&self.session, &self.screen)?;
        self.screen
            .apply(self.enrollments.delete(id), |_| Some(Action::Delete(id)), "Enrollment deleted successfully!")
            .await
    }

    /// Withdraws the current student; the record stays, marked as dropped.
    pub async fn drop_course(&self, id: i64) -> Result<(), ControllerError> {
        require_student(&self.session, &self.screen)?;
        let existing = self.screen.items().into_iter().find(|e| e.id == id);
        self.screen
            .apply(
                self.enrollments.drop_course(id),
                move |_| {
                    existing.map(|mut e| {
                        e.status = Some(EnrollmentStatus::Dropped);
                        Action::Update(e)
                    })
                },
                "Dropped course",
            )
            .await
    }

    pub async fn count_for_course(&self, course_id: i64) -> Result<i64, ControllerError> {
        Ok(self.enrollments.count_by_course(course_id).await?)
    }

    pub async fn count_for_student(&self, student_id: i64) -> Result<i64, ControllerError> {
        Ok(self.enrollments.count_by_student(student_id).await?)
    }
}
