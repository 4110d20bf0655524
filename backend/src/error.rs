use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Serialize, Serializer};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgriError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("Dataset error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upload error: {0}")]
    Multipart(#[from] MultipartError),
}

// Lets handlers return the error inside a JSON payload when they need to.
impl Serialize for AgriError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type AgriResult<T> = Result<T, AgriError>;

impl From<JsonRejection> for AgriError {
    fn from(rejection: JsonRejection) -> Self {
        AgriError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AgriError {
    fn from(rejection: QueryRejection) -> Self {
        AgriError::Validation(rejection.body_text())
    }
}

impl AgriError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AgriError::Validation(_) | AgriError::Multipart(_) => StatusCode::BAD_REQUEST,
            AgriError::AlreadyExists(_) => StatusCode::CONFLICT,
            AgriError::NotFound(_) => StatusCode::NOT_FOUND,
            AgriError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AgriError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AgriError::Validation(msg) | AgriError::AlreadyExists(msg) | AgriError::NotFound(msg) => {
                msg
            }
            AgriError::InvalidCredentials => "Invalid credentials".to_string(),
            AgriError::Multipart(e) => {
                tracing::warn!("Rejected upload: {}", e);
                "Malformed upload".to_string()
            }
            AgriError::Database(ref e) => {
                tracing::error!("Database Error: {:?}", e);
                "A storage error occurred.".to_string()
            }
            AgriError::Internal(msg) => {
                tracing::error!("Internal Error: {}", msg);
                "An internal server error occurred.".to_string()
            }
            AgriError::Io(e) => {
                tracing::error!("IO Error: {:?}", e);
                "A file system error occurred.".to_string()
            }
            other => {
                tracing::error!("Unhandled Error: {:?}", other);
                "An unknown error occurred.".to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_by_category() {
        assert_eq!(
            AgriError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AgriError::AlreadyExists("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AgriError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AgriError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AgriError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_database_error_hides_driver_details() {
        let response = AgriError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "A storage error occurred.");
    }

    #[tokio::test]
    async fn test_json_rejection_becomes_validation() {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::{header, Request};

        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let rejection = axum::Json::<serde_json::Value>::from_request(request, &())
            .await
            .err()
            .unwrap();

        let err = AgriError::from(rejection);
        assert!(matches!(err, AgriError::Validation(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
