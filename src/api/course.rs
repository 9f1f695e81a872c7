use crate::api::segment;
use crate::error::ApiError;
use crate::models::{Course, CourseRequest};
use crate::utils::http::HttpClient;

#[derive(Clone)]
pub struct CourseApi {
    http: HttpClient,
}

impl CourseApi {
    pub fn new(http: HttpClient) -> Self {
        CourseApi { http }
    }

    pub async fn list(&self) -> Result<Vec<Course>, ApiError> {
        self.http.get("/courses", "Failed to fetch courses").await
    }

    pub async fn get(&self, id: i64) -> Result<Course, ApiError> {
        self.http.get(&format!("/courses/{}", id), "Failed to fetch course").await
    }

    pub async fn by_code(&self, code: &str) -> Result<Course, ApiError> {
        self.http
            .get(&format!("/courses/code/{}", segment(code)), "Failed to fetch course by code")
            .await
    }

    // Courses a student may still self-enroll in.
    pub async fn available(&self) -> Result<Vec<Course>, ApiError> {
        self.http.get("/courses/available", "Failed to fetch available courses").await
    }

    pub async fn create(&self, course: &CourseRequest) -> Result<Course, ApiError> {
        self.http.post("/courses", course, "Failed to create course").await
    }

    pub async fn update(&self, id: i64, course: &CourseRequest) -> Result<Course, ApiError> {
        self.http.put(&format!("/courses/{}", id), course, "Failed to update course").await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/courses/{}", id), "Failed to delete course").await
    }
}
