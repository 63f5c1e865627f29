//! Registration, login and profile pages

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use minijinja::context;
use serde::Deserialize;

use super::found;
use crate::api::SharedState;
use crate::auth::models::{
    ChangePasswordForm, DeleteAccountForm, LoginForm, RegisterForm, Role, TokenResponse,
};
use crate::auth::session::{build_session_cookie, clear_session_cookie};
use crate::auth::{hash_password_blocking, verify_password_blocking, CurrentUser};
use crate::error::{Error, Result};

/// Literal the user must type to delete their account
pub const DELETE_CONFIRMATION: &str = "DELETE";

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct RegisterQuery {
    pub msg: Option<String>,
}

/// Whether the client asked for JSON rather than a browser redirect
pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("application/json"))
        .unwrap_or(false)
}

pub async fn register_page(
    State(state): State<SharedState>,
    Query(query): Query<RegisterQuery>,
) -> Result<Response> {
    let roles: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
    Ok(state
        .templates
        .render("register.html", context! { msg => query.msg, roles => roles })?
        .into_response())
}

pub async fn register(
    State(state): State<SharedState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let render_error = |message: &str| -> Result<Response> {
        let roles: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
        Ok(state
            .templates
            .render(
                "register.html",
                context! { error => message, username => &form.username, roles => roles },
            )?
            .into_response())
    };

    if form.username.trim().is_empty() || form.password.is_empty() {
        return render_error("Username and password are required");
    }

    let role: Role = match form.role.parse() {
        Ok(role) => role,
        Err(_) => return render_error("Please choose Patient or Pathologist"),
    };

    if state.db.find_user_by_username(&form.username).await?.is_some() {
        return render_error("Username already taken");
    }

    let hashed = hash_password_blocking(form.password.clone(), state.config.auth.bcrypt_cost).await?;

    match state.db.create_user(&form.username, &hashed, role).await {
        Ok(_) => Ok(found("/login")),
        Err(Error::UserAlreadyExists(_)) => render_error("Username already taken"),
        Err(e) => Err(e),
    }
}

pub async fn login_page(State(state): State<SharedState>) -> Result<Response> {
    Ok(state.templates.render("login.html", context! {})?.into_response())
}

/// Exchange credentials for a token. JSON clients get the token in the body;
/// browsers get the session cookie and a redirect to their dashboard.
pub async fn login(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let json = wants_json(&headers);

    let existing = state.db.find_user_by_username(&form.username).await?;
    let verified = state
        .credentials
        .verify_blocking(
            form.password.clone(),
            existing.as_ref().map(|u| u.hashed_password.clone()),
        )
        .await?;

    // Unknown user and wrong password take the same path
    let user = match existing {
        Some(user) if verified => user,
        _ => {
            tracing::info!("Failed login attempt for '{}'", form.username);
            if json {
                return Ok((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({ "detail": INVALID_CREDENTIALS })),
                )
                    .into_response());
            }
            return Ok(state
                .templates
                .render("login.html", context! { error => INVALID_CREDENTIALS })?
                .into_response());
        }
    };

    let token = state.tokens.issue(&user.username, user.role)?;
    tracing::info!("Login successful for '{}'", user.username);

    if json {
        return Ok(Json(TokenResponse::bearer(token, user.role)).into_response());
    }

    let cookie = build_session_cookie(
        &token,
        state.tokens.ttl().num_seconds(),
        state.config.secure_cookies(),
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        found(&user.role.dashboard_path()),
    )
        .into_response())
}

pub async fn logout(State(state): State<SharedState>) -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies()))],
        found("/login"),
    )
        .into_response()
}

pub async fn profile_page(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    Ok(state
        .templates
        .render("profile.html", context! { user => user })?
        .into_response())
}

pub async fn change_password(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response> {
    let render = |error: Option<&str>, success: Option<&str>| -> Result<Response> {
        Ok(state
            .templates
            .render(
                "profile.html",
                context! { user => &user, error => error, success => success },
            )?
            .into_response())
    };

    if !verify_password_blocking(form.current_password.clone(), user.hashed_password.clone()).await? {
        return render(Some("Incorrect current password"), None);
    }

    if form.new_password != form.confirm_password {
        return render(Some("New passwords do not match"), None);
    }

    if form.new_password.is_empty() {
        return render(Some("New password cannot be empty"), None);
    }

    let hashed = hash_password_blocking(form.new_password, state.config.auth.bcrypt_cost).await?;
    state.db.update_password(user.id, &hashed).await?;
    tracing::info!("Password changed for '{}'", user.username);

    render(None, Some("Password updated successfully"))
}

pub async fn delete_account(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<DeleteAccountForm>,
) -> Result<Response> {
    if form.confirmation != DELETE_CONFIRMATION {
        return Ok(state
            .templates
            .render(
                "profile.html",
                context! { user => user, error => "Type DELETE to confirm" },
            )?
            .into_response());
    }

    state.db.delete_user(user.id).await?;

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies()))],
        found("/register?msg=Account+deleted"),
    )
        .into_response())
}
