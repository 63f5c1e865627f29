//! Authentication models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Uploads images and sees their own results
    Patient,
    /// Reviews every prediction and exports them
    Pathologist,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Patient, Role::Pathologist];

    /// Stored and displayed form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Pathologist => "Pathologist",
        }
    }

    /// URL segment of the role's area, e.g. `/patient/...`
    pub fn slug(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Pathologist => "pathologist",
        }
    }

    pub fn dashboard_path(&self) -> String {
        format!("/{}/dashboard", self.slug())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "pathologist" => Ok(Role::Pathologist),
            _ => Err(Error::InvalidRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Persisted user record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Login form fields
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form fields
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    #[serde(default = "default_register_role")]
    pub role: String,
}

fn default_register_role() -> String {
    Role::Patient.slug().to_string()
}

/// Password change form fields
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Account deletion form fields
#[derive(Debug, Deserialize)]
pub struct DeleteAccountForm {
    pub confirmation: String,
}

/// Login response for JSON clients
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: Role,
}

impl TokenResponse {
    pub fn bearer(access_token: String, role: Role) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            role,
        }
    }
}
