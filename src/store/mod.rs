//! Relational store for users and predictions

mod db;
mod predictions;
mod users;

pub use db::Database;
pub use predictions::{CaseRecord, NewPrediction, Prediction, PredictionStatus, ReviewAction};
pub use users::UserSummary;
