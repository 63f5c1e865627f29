//! IDC Detect Portal - breast histopathology screening portal
//!
//! Patients upload tissue images and receive an IDC classification from a
//! pretrained model; pathologists review, annotate and export every result.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod inference;
pub mod store;
pub mod ui;
pub mod uploads;

pub use config::Config;
pub use error::Error;
