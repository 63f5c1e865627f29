//! CLI interface for IDC Detect Portal

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "idcdetect")]
#[command(version)]
#[command(about = "IDC screening portal for patients and pathologists", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new idcdetect.toml configuration file
    Init,

    /// Start the web portal
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List registered users
    Users {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create a user, prompting for the password
    AddUser {
        /// Username to register
        #[arg(short, long)]
        username: String,

        /// Role: patient or pathologist
        #[arg(short, long, default_value = "patient")]
        role: String,
    },

    /// Export all predictions as CSV
    Export {
        /// Output file (defaults to idc_predictions_export.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check configuration, token secret, model and database
    Doctor,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
