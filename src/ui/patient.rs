//! Patient pages: dashboard, upload, result and report

use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use minijinja::context;

use super::{found, PredictionView};
use crate::api::SharedState;
use crate::auth::models::{Role, User};
use crate::auth::{require, Access, CurrentUser};
use crate::error::{Error, Result};
use crate::inference::Classification;
use crate::store::{NewPrediction, Prediction};
use crate::uploads::{discard_upload, save_upload};

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

pub async fn dashboard(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    require(&user, Role::Patient, Access::Page)?;

    let predictions: Vec<PredictionView> = state
        .db
        .list_predictions_for_user(user.id)
        .await?
        .iter()
        .map(PredictionView::from)
        .collect();

    Ok(state
        .templates
        .render(
            "patient_dashboard.html",
            context! { user => user, predictions => predictions },
        )?
        .into_response())
}

/// Store the image, classify it and record the prediction
pub async fn upload(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Response> {
    require(&user, Role::Patient, Access::Action)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await?;
            upload = Some((file_name, bytes));
            break;
        }
    }

    let Some((file_name, bytes)) = upload else {
        return Err(Error::InvalidUpload("missing 'file' field".to_string()));
    };
    if bytes.is_empty() {
        return Err(Error::InvalidUpload("uploaded file is empty".to_string()));
    }

    let stored = save_upload(&state.config.storage.upload_dir, &file_name, &bytes).await?;

    let classifier = state.classifier.clone();
    let classification = tokio::task::spawn_blocking(move || classifier.classify(&bytes))
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Inference task failed, recording default negative: {}", e);
            Classification::failed()
        });

    let prediction = match state
        .db
        .create_prediction(NewPrediction {
            user_id: user.id,
            image_path: stored.path.to_string_lossy().into_owned(),
            result_class: classification.label,
            confidence: classification.confidence,
        })
        .await
    {
        Ok(prediction) => prediction,
        Err(e) => {
            discard_upload(&stored).await;
            return Err(e);
        }
    };

    tracing::debug!(
        "Prediction {} from {:?} inference",
        prediction.id,
        classification.source
    );

    Ok(found(&format!("/patient/result/{}", prediction.id)))
}

/// Fetch a prediction only if `user` owns it
async fn owned_prediction(state: &SharedState, user: &User, id: i64) -> Result<Option<Prediction>> {
    Ok(state
        .db
        .get_prediction(id)
        .await?
        .filter(|p| p.user_id == user.id))
}

pub async fn result(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    // Missing and foreign predictions look the same
    let Some(prediction) = owned_prediction(&state, &user, id).await? else {
        return Ok(found(&user.role.dashboard_path()));
    };

    Ok(state
        .templates
        .render(
            "result.html",
            context! { user => user, prediction => PredictionView::from(&prediction) },
        )?
        .into_response())
}

/// Printable report for one of the user's own predictions
pub async fn report(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(prediction) = owned_prediction(&state, &user, id).await? else {
        return Ok(found(&user.role.dashboard_path()));
    };

    Ok(state
        .templates
        .render(
            "report.html",
            context! {
                user => user,
                prediction => PredictionView::from(&prediction),
                report_date => Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        )?
        .into_response())
}
