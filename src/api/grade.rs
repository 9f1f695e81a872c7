use crate::error::ApiError;
use crate::models::{Grade, GradeRequest};
use crate::utils::http::HttpClient;

#[derive(Clone)]
pub struct GradeApi {
    http: HttpClient,
}

impl GradeApi {
    pub fn new(http: HttpClient) -> Self {
        GradeApi { http }
    }

    pub async fn list(&self) -> Result<Vec<Grade>, ApiError> {
        self.http.get("/grades", "Failed to fetch grades").await
    }

    pub async fn get(&self, id: i64) -> Result<Grade, ApiError> {
        self.http.get(&format!("/grades/{}", id), "Failed to fetch grade").await
    }

    pub async fn by_enrollment(&self, enrollment_id: i64) -> Result<Vec<Grade>, ApiError> {
        self.http
            .get(&format!("/grades/enrollment/{}", enrollment_id), "Failed to fetch enrollment grades")
            .await
    }

    pub async fn by_student(&self, student_id: i64) -> Result<Vec<Grade>, ApiError> {
        self.http
            .get(&format!("/grades/student/{}", student_id), "Failed to fetch student grades")
            .await
    }

    pub async fn by_course(&self, course_id: i64) -> Result<Vec<Grade>, ApiError> {
        self.http
            .get(&format!("/grades/course/{}", course_id), "Failed to fetch course grades")
            .await
    }

    // The backend answers `null` when there is nothing to average.
    pub async fn average_for_student(&self, student_id: i64) -> Result<f64, ApiError> {
        let avg: Option<f64> = self
            .http
            .get(&format!("/grades/average/student/{}", student_id), "Failed to get average")
            .await?;
        Ok(avg.unwrap_or(0.0))
    }

    pub async fn average_for_course(&self, course_id: i64) -> Result<f64, ApiError> {
        let avg: Option<f64> = self
            .http
            .get(&format!("/grades/average/course/{}", course_id), "Failed to get average")
            .await?;
        Ok(avg.unwrap_or(0.0))
    }

    pub async fn mine(&self) -> Result<Vec<Grade>, ApiError> {
        self.http.get("/grades/my-grades", "Failed to fetch your grades").await
    }

    pub async fn mine_for_course(&self, course_id: i64) -> Result<Vec<Grade>, ApiError> {
        self.http
            .get(&format!("/grades/my-grades/course/{}", course_id), "Failed to fetch your course grades")
            .await
    }

    pub async fn my_average(&self) -> Result<f64, ApiError> {
        let avg: Option<f64> = self.http.get("/grades/my-average", "Failed to get your average").await?;
        Ok(avg.unwrap_or(0.0))
    }

    pub async fn create(&self, request: &GradeRequest) -> Result<Grade, ApiError> {
        self.http.post("/grades", request, "Failed to save grade").await
    }

    pub async fn update(&self, id: i64, request: &GradeRequest) -> Result<Grade, ApiError> {
        self.http.put(&format!("/grades/{}", id), request, "Failed to save grade").await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.http.delete(&format!("/grades/{}", id), "Failed to delete grade").await
    }
}
