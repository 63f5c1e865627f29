//! Server-rendered pages

pub mod account;
pub mod pathologist;
pub mod patient;
mod templates;

pub use templates::Templates;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::store::{CaseRecord, Prediction};
use crate::uploads::image_url;

/// `302 Found` to `location`
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Landing page sends everyone to the login form
pub async fn index() -> Response {
    found("/login")
}

/// Template-facing rendering of a prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionView {
    pub id: i64,
    pub user_id: i64,
    pub owner: Option<String>,
    pub image_path: String,
    pub image_url: String,
    pub label: &'static str,
    pub positive: bool,
    pub confidence: String,
    pub confidence_pct: String,
    pub status: String,
    pub notes: Option<String>,
    pub timestamp: String,
}

impl From<&Prediction> for PredictionView {
    fn from(p: &Prediction) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            owner: None,
            image_path: p.image_path.clone(),
            image_url: image_url(&p.image_path),
            label: p.label(),
            positive: p.is_positive(),
            confidence: format!("{:.4}", p.confidence),
            confidence_pct: format!("{:.2}", p.confidence * 100.0),
            status: p.status.to_string(),
            notes: p.notes.clone(),
            timestamp: p.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl From<&CaseRecord> for PredictionView {
    fn from(case: &CaseRecord) -> Self {
        let mut view = PredictionView::from(&case.prediction);
        view.owner = Some(case.owner_username.clone());
        view
    }
}
