//! HTTP server

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{CredentialVerifier, SessionResolver, TokenIssuer};
use crate::config::Config;
use crate::error::Result;
use crate::inference::Classifier;
use crate::store::Database;
use crate::ui::{self, Templates};
use crate::uploads::UPLOADS_URL_PREFIX;

use super::routes;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub tokens: Arc<TokenIssuer>,
    pub sessions: SessionResolver,
    pub credentials: CredentialVerifier,
    pub classifier: Arc<Classifier>,
    pub templates: Templates,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Assemble state from already-built collaborators
    pub fn new(config: Config, db: Database, tokens: TokenIssuer, classifier: Classifier) -> Result<Self> {
        let tokens = Arc::new(tokens);
        let sessions = SessionResolver::new(Arc::clone(&tokens), db.clone());
        let credentials = CredentialVerifier::new(config.auth.bcrypt_cost)?;

        Ok(Self {
            config,
            db,
            tokens,
            sessions,
            credentials,
            classifier: Arc::new(classifier),
            templates: Templates::new()?,
        })
    }

    /// Connect the database, resolve the token secret and load the model
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = Database::connect(&config.database).await?;
        let (tokens, secret_source) = TokenIssuer::from_config(&config);
        let classifier = Classifier::load(&config.model);

        tracing::info!(
            "Environment: {}, token secret from {}, inference mode: {}",
            config.server.environment,
            secret_source,
            classifier.mode()
        );

        Self::new(config, db, tokens, classifier)
    }
}

/// Run the HTTP server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::from_config(config).await?);

    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let uploads = ServeDir::new(&state.config.storage.upload_dir);
    let body_limit = state.config.storage.max_upload_bytes;

    Router::new()
        .route("/", get(ui::index))
        // API routes
        .route("/api/health", get(routes::health))
        // Account routes
        .route(
            "/register",
            get(ui::account::register_page).post(ui::account::register),
        )
        .route("/login", get(ui::account::login_page))
        .route("/token", post(ui::account::login))
        .route("/logout", get(ui::account::logout))
        .route("/profile", get(ui::account::profile_page))
        .route("/profile/password", post(ui::account::change_password))
        .route("/profile/delete", post(ui::account::delete_account))
        // Patient routes
        .route("/patient/dashboard", get(ui::patient::dashboard))
        .route("/patient/upload", post(ui::patient::upload))
        .route("/patient/result/{id}", get(ui::patient::result))
        .route("/patient/report/{id}", get(ui::patient::report))
        // Pathologist routes
        .route("/pathologist/dashboard", get(ui::pathologist::dashboard))
        .route("/pathologist/cases", get(ui::pathologist::cases))
        .route("/pathologist/review/{id}", post(ui::pathologist::review))
        .route("/pathologist/export", get(ui::pathologist::export))
        // Stored images
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
