//! Pathologist pages: dashboard, case review and CSV export

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Form,
};
use minijinja::context;
use serde::{Deserialize, Serialize};

use super::{found, PredictionView};
use crate::api::SharedState;
use crate::auth::models::Role;
use crate::auth::{require, Access, CurrentUser};
use crate::error::Result;
use crate::export::{predictions_to_csv, EXPORT_FILENAME};
use crate::store::{CaseRecord, PredictionStatus, ReviewAction};

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub action: String,
    pub notes: Option<String>,
}

/// Summary counts shown on the dashboard
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaseStats {
    pub total: usize,
    pub pending: usize,
    pub positive: usize,
}

impl CaseStats {
    pub fn from_cases(cases: &[CaseRecord]) -> Self {
        Self {
            total: cases.len(),
            pending: cases
                .iter()
                .filter(|c| c.prediction.status == PredictionStatus::Pending)
                .count(),
            positive: cases.iter().filter(|c| c.prediction.is_positive()).count(),
        }
    }
}

pub async fn dashboard(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    require(&user, Role::Pathologist, Access::Page)?;

    let cases = state.db.list_cases().await?;
    let stats = CaseStats::from_cases(&cases);
    let predictions: Vec<PredictionView> = cases.iter().map(PredictionView::from).collect();

    Ok(state
        .templates
        .render(
            "pathologist_dashboard.html",
            context! { user => user, stats => stats, predictions => predictions },
        )?
        .into_response())
}

pub async fn cases(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    require(&user, Role::Pathologist, Access::Page)?;

    let predictions: Vec<PredictionView> = state
        .db
        .list_cases()
        .await?
        .iter()
        .map(PredictionView::from)
        .collect();

    Ok(state
        .templates
        .render(
            "pathologist_cases.html",
            context! { user => user, predictions => predictions },
        )?
        .into_response())
}

/// Approve, reject or annotate a case, then return to the case list
pub async fn review(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    require(&user, Role::Pathologist, Access::Action)?;

    let action = ReviewAction::from_form(&form.action);
    if state
        .db
        .review_prediction(id, action, form.notes.as_deref())
        .await?
        .is_none()
    {
        tracing::warn!("Review by '{}' for unknown prediction {}", user.username, id);
    }

    Ok(found("/pathologist/cases"))
}

pub async fn export(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    require(&user, Role::Pathologist, Access::Action)?;

    let cases = state.db.list_cases().await?;
    let body = predictions_to_csv(&cases)?;
    tracing::info!("'{}' exported {} predictions", user.username, cases.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", EXPORT_FILENAME),
            ),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Prediction;
    use chrono::Utc;

    fn case(id: i64, result_class: i64, status: PredictionStatus) -> CaseRecord {
        CaseRecord {
            prediction: Prediction {
                id,
                user_id: 1,
                image_path: format!("static/uploads/{}.png", id),
                result_class,
                confidence: 0.9,
                notes: None,
                status,
                timestamp: Utc::now(),
            },
            owner_username: "alice".to_string(),
        }
    }

    #[test]
    fn test_case_stats() {
        let cases = vec![
            case(1, 1, PredictionStatus::Pending),
            case(2, 0, PredictionStatus::Approved),
            case(3, 1, PredictionStatus::Rejected),
            case(4, 0, PredictionStatus::Pending),
        ];
        assert_eq!(
            CaseStats::from_cases(&cases),
            CaseStats {
                total: 4,
                pending: 2,
                positive: 2
            }
        );
        assert_eq!(CaseStats::from_cases(&[]), CaseStats::default());
    }
}
