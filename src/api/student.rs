use crate::api::segment;
use crate::error::ApiError;
use crate::models::{Student, StudentRequest};
use crate::utils::http::HttpClient;

#[derive(Clone)]
pub struct StudentApi {
    http: HttpClient,
}

impl StudentApi {
    pub fn new(http: HttpClient) -> Self {
        StudentApi { http }
    }

    pub async fn list(&self) -> Result<Vec<Student>, ApiError> {
        self.http.get("/students", "Failed to fetch students").await
    }

    pub async fn get(&self, id: i64) -> Result<Student, ApiError> {
        self.http.get(&format!("/students/{}", id), "Failed to fetch student").await
    }

    /// Looks a student up by their university number (e.g. `STU2025001`), not the record id.
    pub async fn by_student_id(&self, student_id: &str) -> Result<Student, ApiError> {
        self.http
            .get(&format!("/students/student-id/{}", segment(student_id)), "Failed to fetch student")
            .await
    }

    pub async fn by_department(&self, department: &str) -> Result<Vec<Student>, ApiError> {
        self.http
            .get(
                &format!("/students/department/{}", segment(department)),
                "Failed to fetch students by department",
            )
            .await
    }

    pub async fn search(&self, keyword: &str) -> Result<Vec<Student>, ApiError> {
        self.http
            .get_with_query("/students/search", &[("keyword", keyword)], "Failed to search students")
            .await
    }

    pub async fn create(&self, student: &StudentRequest) -> Result<Student, ApiError> {
        self.http.post("/students", student, "Failed to create student").await
    }

    pub async fn update(&self, id: i64, student: &StudentRequest) -> Result<Student, ApiError> {
        self.http.put(&format!("/students/{}", id), student, "Failed to update student").await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/students/{}", id), "Failed to delete student").await
    }
}
