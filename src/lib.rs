//! Client for the university course-management backend: typed REST wrappers,
//! a persisted login session, and per-screen controllers that keep list state
//! in step with the backend.

pub mod api;
pub mod app;
pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod navigation;
pub mod session;
pub mod utils;
pub mod validation;

pub use app::App;
pub use config::Config;
pub use error::ApiError;
pub use session::SessionStore;
