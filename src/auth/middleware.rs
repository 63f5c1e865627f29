//! Authentication extractor and role gate

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::SharedState;
use crate::auth::models::{Role, User};
use crate::error::{Error, Result};

/// The authenticated user behind a request.
///
/// Rejects with `Error::Unauthenticated` (401) when neither the cookie nor the
/// `Authorization` header resolves to an existing user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user = state.sessions.resolve(&parts.headers).await?;
        Ok(CurrentUser(user))
    }
}

/// What kind of request the gate is protecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Page view: denial redirects to the login page
    Page,
    /// Mutating or data action: denial is a 403
    Action,
}

/// Check the user's role against the one required
pub fn require(user: &User, expected: Role, access: Access) -> Result<()> {
    if user.role == expected {
        return Ok(());
    }

    tracing::warn!(
        "User '{}' with role {} denied {:?} requiring {}",
        user.username,
        user.role,
        access,
        expected
    );

    Err(match access {
        Access::Page => Error::PageDenied,
        Access::Action => Error::Forbidden,
    })
}
