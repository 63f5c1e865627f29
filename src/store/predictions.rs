//! Prediction store

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::Database;
use crate::error::{Error, Result};

/// Reviewer lifecycle of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PredictionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Pending => "Pending",
            PredictionStatus::Approved => "Approved",
            PredictionStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredictionStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(PredictionStatus::Pending),
            "approved" => Ok(PredictionStatus::Approved),
            "rejected" => Ok(PredictionStatus::Rejected),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for PredictionStatus {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// What a pathologist asked for on the review form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Reject,
    /// Leaves the status alone; only notes change
    SaveNote,
}

impl ReviewAction {
    /// Form button value. Anything other than Approve/Reject only saves notes.
    pub fn from_form(value: &str) -> Self {
        match value.trim() {
            v if v.eq_ignore_ascii_case("approve") => ReviewAction::Approve,
            v if v.eq_ignore_ascii_case("reject") => ReviewAction::Reject,
            _ => ReviewAction::SaveNote,
        }
    }

    pub fn status(&self) -> Option<PredictionStatus> {
        match self {
            ReviewAction::Approve => Some(PredictionStatus::Approved),
            ReviewAction::Reject => Some(PredictionStatus::Rejected),
            ReviewAction::SaveNote => None,
        }
    }
}

/// Persisted model output for one uploaded image
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Prediction {
    pub id: i64,
    pub user_id: i64,
    pub image_path: String,
    pub result_class: i64,
    pub confidence: f64,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PredictionStatus,
    pub timestamp: DateTime<Utc>,
}

impl Prediction {
    pub fn is_positive(&self) -> bool {
        self.result_class == 1
    }

    /// Label used in exports and tables
    pub fn label(&self) -> &'static str {
        if self.is_positive() {
            "IDC Positive"
        } else {
            "Negative"
        }
    }
}

/// A prediction joined with its owner's username, for the reviewer views
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CaseRecord {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub prediction: Prediction,
    pub owner_username: String,
}

/// Fields needed to record a new prediction
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: i64,
    pub image_path: String,
    pub result_class: i64,
    pub confidence: f64,
}

const PREDICTION_COLUMNS: &str =
    "id, user_id, image_path, result_class, confidence, notes, status, timestamp";

impl Database {
    pub async fn create_prediction(&self, new: NewPrediction) -> Result<Prediction> {
        let prediction = sqlx::query_as::<_, Prediction>(&format!(
            "INSERT INTO predictions (user_id, image_path, result_class, confidence, status, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {}",
            PREDICTION_COLUMNS
        ))
        .bind(new.user_id)
        .bind(&new.image_path)
        .bind(new.result_class)
        .bind(new.confidence)
        .bind(PredictionStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool())
        .await?;

        tracing::info!(
            "Recorded prediction {} for user {} ({}, {:.4})",
            prediction.id,
            prediction.user_id,
            prediction.label(),
            prediction.confidence
        );
        Ok(prediction)
    }

    pub async fn get_prediction(&self, id: i64) -> Result<Option<Prediction>> {
        let prediction = sqlx::query_as::<_, Prediction>(&format!(
            "SELECT {} FROM predictions WHERE id = ?",
            PREDICTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(prediction)
    }

    /// A user's own predictions, newest first
    pub async fn list_predictions_for_user(&self, user_id: i64) -> Result<Vec<Prediction>> {
        let predictions = sqlx::query_as::<_, Prediction>(&format!(
            "SELECT {} FROM predictions WHERE user_id = ? ORDER BY timestamp DESC, id DESC",
            PREDICTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(predictions)
    }

    /// Every prediction with its owner, newest first
    pub async fn list_cases(&self) -> Result<Vec<CaseRecord>> {
        let cases = sqlx::query_as::<_, CaseRecord>(
            "SELECT p.id, p.user_id, p.image_path, p.result_class, p.confidence, p.notes, \
                    p.status, p.timestamp, u.username AS owner_username \
             FROM predictions p JOIN users u ON u.id = p.user_id \
             ORDER BY p.timestamp DESC, p.id DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(cases)
    }

    /// Apply a reviewer action. Notes are updated whenever non-empty notes are
    /// supplied, independent of the action. Returns `None` for an unknown id.
    pub async fn review_prediction(
        &self,
        id: i64,
        action: ReviewAction,
        notes: Option<&str>,
    ) -> Result<Option<Prediction>> {
        let notes = notes.filter(|n| !n.trim().is_empty());
        let status = action.status().map(|s| s.as_str());

        let prediction = sqlx::query_as::<_, Prediction>(&format!(
            "UPDATE predictions SET status = COALESCE(?, status), notes = COALESCE(?, notes) \
             WHERE id = ? RETURNING {}",
            PREDICTION_COLUMNS
        ))
        .bind(status)
        .bind(notes)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        if let Some(p) = &prediction {
            tracing::info!("Prediction {} reviewed: {:?} -> {}", p.id, action, p.status);
        }
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_action_from_form() {
        assert_eq!(ReviewAction::from_form("Approve"), ReviewAction::Approve);
        assert_eq!(ReviewAction::from_form("reject"), ReviewAction::Reject);
        assert_eq!(ReviewAction::from_form("Save Note"), ReviewAction::SaveNote);
        assert_eq!(ReviewAction::from_form(""), ReviewAction::SaveNote);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<PredictionStatus>().unwrap(), PredictionStatus::Pending);
        assert_eq!("Approved".parse::<PredictionStatus>().unwrap(), PredictionStatus::Approved);
        assert!("reviewed".parse::<PredictionStatus>().is_err());
    }
}
