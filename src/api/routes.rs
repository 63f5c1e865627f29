//! API route handlers

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use super::server::SharedState;
use crate::inference::InferenceMode;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub inference_mode: InferenceMode,
}

// Health check

pub async fn health(State(state): State<SharedState>) -> impl IntoResponse {
    Json(ApiResponse::ok(Health {
        status: "healthy",
        inference_mode: state.classifier.mode(),
    }))
}
