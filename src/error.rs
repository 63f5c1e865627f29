//! Error types for the IDC Detect Portal

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Upload error: {0}")]
    Upload(#[from] axum::extract::multipart::MultipartError),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Not authorized")]
    Forbidden,

    #[error("Page requires a different role")]
    PageDenied,

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("Unknown role: {0}")]
    InvalidRole(String),

    #[error("Unknown prediction status: {0}")]
    InvalidStatus(String),

    #[error("Config file not found. Run 'idcdetect init' first.")]
    ConfigNotFound,

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer")],
                "Not authenticated",
            )
                .into_response(),
            Error::Forbidden => (StatusCode::FORBIDDEN, "Not authorized").into_response(),
            Error::PageDenied => crate::ui::found("/login"),
            Error::InvalidUpload(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            Error::Upload(e) => (e.status(), e.body_text()).into_response(),
            other => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred",
                )
                    .into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
