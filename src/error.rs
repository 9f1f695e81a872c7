use thiserror::Error;

/// Failure of a single backend call.
///
/// Every variant carries a message fit for an error banner: the backend's own
/// `message` when it sent one, otherwise the fallback of the operation that failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("{message}")]
    Transport { message: String, detail: String },

    #[error("{message}")]
    Decode { message: String, detail: String },

    #[error("Failed to persist session: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", err))
    }
}
