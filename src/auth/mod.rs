//! Authentication and session management

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod session;

pub use jwt::{Claims, InvalidToken, SecretSource, TokenIssuer};
pub use middleware::{require, Access, CurrentUser};
pub use models::{Role, User};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    CredentialVerifier,
};
pub use session::{SessionResolver, ACCESS_TOKEN_COOKIE};
