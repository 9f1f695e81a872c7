//! Typed wrappers over the backend, one module per resource.
//!
//! Every function performs exactly one HTTP call. Failures carry the backend's
//! `message` when it sent one, otherwise the per-operation fallback below.

pub mod auth;
pub mod course;
pub mod enrollment;
pub mod grade;
pub mod student;

use crate::utils::http::HttpClient;
use self::auth::AuthApi;
use self::course::CourseApi;
use self::enrollment::EnrollmentApi;
use self::grade::GradeApi;
use self::student::StudentApi;

// Path segments are user input (department names, student numbers).
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[derive(Clone)]
pub struct Api {
    pub auth: AuthApi,
    pub courses: CourseApi,
    pub students: StudentApi,
    pub enrollments: EnrollmentApi,
    pub grades: GradeApi,
}

impl Api {
    pub fn new(http: HttpClient) -> Self {
        Api {
            auth: AuthApi::new(http.clone()),
            courses: CourseApi::new(http.clone()),
            students: StudentApi::new(http.clone()),
            enrollments: EnrollmentApi::new(http.clone()),
            grades: GradeApi::new(http),
        }
    }
}
