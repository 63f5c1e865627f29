//! CLI command implementations

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Password};
use std::fs;
use std::path::PathBuf;

use crate::auth::models::Role;
use crate::auth::{hash_password_blocking, SecretSource, TokenIssuer};
use crate::cli::{check, error, info, print_user_table, success, warn, OutputFormat};
use crate::config::{self, loader::CONFIG_FILENAME};
use crate::export::{predictions_to_csv, EXPORT_FILENAME};
use crate::inference::{Classifier, InferenceMode};
use crate::store::Database;

/// Initialize a new idcdetect.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Set SECRET_KEY before running in production, then start the portal with 'idcdetect serve'");

    Ok(())
}

/// Start the web portal
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let (config, _) = config::load_config_or_default()?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting portal at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// List registered users
pub async fn users(format: OutputFormat) -> Result<()> {
    let db = open_database().await?;
    let users = db.list_users().await?;

    match format {
        OutputFormat::Table => {
            print_user_table(&users);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&users)?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&users)?;
            println!("{}", yaml);
        }
    }

    Ok(())
}

/// Create a user from the terminal
pub async fn add_user(username: &str, role: &str) -> Result<()> {
    let role: Role = role.parse()?;
    let username = username.trim();
    if username.is_empty() {
        anyhow::bail!("Username cannot be empty");
    }

    let (config, _) = config::load_config_or_default()?;
    let db = Database::connect(&config.database).await?;

    let password = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Password for {}", username))
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?;

    let hashed = hash_password_blocking(password, config.auth.bcrypt_cost).await?;

    match db.create_user(username, &hashed, role).await {
        Ok(user) => {
            success(&format!("Created {} '{}'", user.role, user.username));
            Ok(())
        }
        Err(e) => {
            error(&format!("Failed to create user: {}", e));
            Err(e.into())
        }
    }
}

/// Write every prediction to a CSV file
pub async fn export(output: Option<PathBuf>) -> Result<()> {
    let db = open_database().await?;
    let cases = db.list_cases().await?;

    let output = output.unwrap_or_else(|| PathBuf::from(EXPORT_FILENAME));
    fs::write(&output, predictions_to_csv(&cases)?)?;

    success(&format!(
        "Exported {} predictions to {}",
        cases.len(),
        output.display()
    ));
    Ok(())
}

/// Check configuration, token secret, model and database
pub async fn doctor() -> Result<()> {
    println!("IDC Detect Portal Doctor");
    println!();

    let (config, path) = config::load_config_or_default()?;
    match path {
        Some(path) => check("Config", true, &path.display().to_string()),
        None => check("Config", false, "not found, using defaults"),
    }
    check(
        "Environment",
        true,
        &config.server.environment.to_string(),
    );

    let (_, secret_source) = TokenIssuer::from_config(&config);
    let secret_ok =
        !(config.server.environment.is_production() && secret_source == SecretSource::Fallback);
    check("Token secret", secret_ok, &secret_source.to_string());

    let classifier = Classifier::load(&config.model);
    check(
        "Model",
        classifier.mode() == InferenceMode::Model,
        &format!("{} ({})", config.model.path.display(), classifier.mode()),
    );

    match Database::connect(&config.database).await {
        Ok(db) => match db.ping().await {
            Ok(()) => check("Database", true, &config.database.url),
            Err(e) => check("Database", false, &e.to_string()),
        },
        Err(e) => check("Database", false, &e.to_string()),
    }

    check(
        "Uploads",
        true,
        &config.storage.upload_dir.display().to_string(),
    );

    Ok(())
}

// Helper functions

async fn open_database() -> Result<Database> {
    let (config, _) = config::load_config_or_default()?;
    Database::connect(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))
}
