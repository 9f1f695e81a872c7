use crate::error::ApiError;
use crate::models::{Enrollment, EnrollmentCheck, EnrollmentRequest, EnrollmentStatus};
use crate::utils::http::HttpClient;

#[derive(Clone)]
pub struct EnrollmentApi {
    http: HttpClient,
}

impl EnrollmentApi {
    pub fn new(http: HttpClient) -> Self {
        EnrollmentApi { http }
    }

    pub async fn list(&self) -> Result<Vec<Enrollment>, ApiError> {
        self.http.get("/enrollments", "Failed to fetch enrollments").await
    }

    pub async fn get(&self, id: i64) -> Result<Enrollment, ApiError> {
        self.http.get(&format!("/enrollments/{}", id), "Failed to fetch enrollment").await
    }

    pub async fn by_student(&self, student_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        self.http
            .get(&format!("/enrollments/student/{}", student_id), "Failed to fetch student enrollments")
            .await
    }

    pub async fn by_course(&self, course_id: i64) -> Result<Vec<Enrollment>, ApiError> {
        self.http
            .get(&format!("/enrollments/course/{}", course_id), "Failed to fetch course enrollments")
            .await
    }

    pub async fn mine(&self) -> Result<Vec<Enrollment>, ApiError> {
        self.http.get("/enrollments/my-enrollments", "Failed to fetch your enrollments").await
    }

    pub async fn create(&self, request: &EnrollmentRequest) -> Result<Enrollment, ApiError> {
        self.http.post("/enrollments", request, "Failed to create enrollment").await
    }

    pub async fn self_enroll(&self, course_id: i64) -> Result<Enrollment, ApiError> {
        self.http
            .post_empty(&format!("/enrollments/self-enroll/{}", course_id), "Failed to enroll in course")
            .await
    }

    pub async fn update(&self, id: i64, request: &EnrollmentRequest) -> Result<Enrollment, ApiError> {
        self.http
            .put(&format!("/enrollments/{}", id), request, "Failed to update enrollment")
            .await
    }

    pub async fn update_status(&self, id: i64, status: EnrollmentStatus) -> Result<Enrollment, ApiError> {
        self.http
            .put_with_query(
                &format!("/enrollments/{}/status", id),
                &[("status", status.as_str())],
                "Failed to update enrollment status",
            )
            .await
    }

    pub async fn count_by_course(&self, course_id: i64) -> Result<i64, ApiError> {
        self.http
            .get(&format!("/enrollments/count/course/{}", course_id), "Failed to count course enrollments")
            .await
    }

    pub async fn count_by_student(&self, student_id: i64) -> Result<i64, ApiError> {
        self.http
            .get(&format!("/enrollments/count/student/{}", student_id), "Failed to count student enrollments")
            .await
    }

    pub async fn status_for_course(&self, course_id: i64) -> Result<EnrollmentCheck, ApiError> {
        self.http
            .get(&format!("/enrollments/status/course/{}", course_id), "Failed to check enrollment status")
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/enrollments/{}", id), "Failed to delete enrollment").await
    }

    // Student-initiated withdrawal, as opposed to an admin deleting the record.
    pub async fn drop_course(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/enrollments/{}/drop", id), "Failed to drop course").await
    }
}
