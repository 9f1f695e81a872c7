use crate::error::ApiError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::utils::http::HttpClient;

#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        AuthApi { http }
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.http
            .post("/auth/login", credentials, "Login failed. Please check your credentials.")
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.http.post("/auth/register", request, "Registration failed").await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.http.get("/auth/me", "Failed to fetch current user").await
    }
}
