//! JWT token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::Role;
use crate::config::{Config, Environment};
use crate::error::{Error, Result};

/// Used only when no secret is configured anywhere
pub const DEV_FALLBACK_SECRET: &str = "idcdetect-local-development-secret";

/// Environment variable consulted when the config file leaves the secret empty
pub const SECRET_ENV_VAR: &str = "SECRET_KEY";

const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Role at issue time
    pub role: Role,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Token verification failed. Deliberately carries no cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

impl std::fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid token")
    }
}

impl std::error::Error for InvalidToken {}

/// Where the signing secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Config,
    Environment,
    Fallback,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::Config => write!(f, "config file"),
            SecretSource::Environment => write!(f, "{} environment variable", SECRET_ENV_VAR),
            SecretSource::Fallback => write!(f, "built-in development fallback"),
        }
    }
}

#[derive(Clone)]
pub struct TokenSecret {
    value: String,
    pub source: SecretSource,
}

impl std::fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSecret")
            .field("value", &mask_value(&self.value))
            .field("source", &self.source)
            .finish()
    }
}

/// Mask a secret for logs: first and last five characters only
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return "NONE".to_string();
    }
    if chars.len() < 10 {
        return "****".to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Pick the signing secret: config, then environment, then the fallback.
///
/// A missing secret in production is logged as a warning and the fallback is
/// used anyway; startup does not fail.
pub fn resolve_secret(
    configured: Option<&str>,
    env_value: Option<String>,
    environment: Environment,
) -> TokenSecret {
    let configured = configured.map(str::trim).filter(|s| !s.is_empty());
    let env_value = env_value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let secret = if let Some(value) = configured {
        TokenSecret {
            value: value.to_string(),
            source: SecretSource::Config,
        }
    } else if let Some(value) = env_value {
        TokenSecret {
            value,
            source: SecretSource::Environment,
        }
    } else {
        TokenSecret {
            value: DEV_FALLBACK_SECRET.to_string(),
            source: SecretSource::Fallback,
        }
    };

    match (secret.source, environment) {
        (SecretSource::Fallback, Environment::Production) => {
            tracing::warn!(
                "No token secret configured in production; falling back to the development secret. \
                 Tokens can be forged by anyone who knows it. Set {} or auth.secret_key.",
                SECRET_ENV_VAR
            );
        }
        (SecretSource::Fallback, Environment::Development) => {
            tracing::info!("Using default local token secret");
        }
        (source, environment) => {
            tracing::info!(
                "Token secret loaded from {} (masked: {}, len: {})",
                source,
                mask_value(&secret.value),
                secret.value.chars().count()
            );
            if environment.is_production()
                && secret.value.chars().count() < MIN_PRODUCTION_SECRET_LEN
            {
                tracing::warn!(
                    "Token secret is shorter than {} characters",
                    MIN_PRODUCTION_SECRET_LEN
                );
            }
        }
    }

    secret
}

/// Issues and verifies signed, time-limited bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Build from config, consulting `SECRET_KEY` when the file leaves it empty
    pub fn from_config(config: &Config) -> (Self, SecretSource) {
        let secret = resolve_secret(
            config.auth.secret_key.as_deref(),
            std::env::var(SECRET_ENV_VAR).ok(),
            config.server.environment,
        );
        (Self::new(&secret.value, config.token_ttl()), secret.source)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token with the configured lifetime
    pub fn issue(&self, subject: &str, role: Role) -> Result<String> {
        self.issue_with_ttl(subject, role, self.ttl)
    }

    /// Issue a token with an explicit lifetime
    pub fn issue_with_ttl(&self, subject: &str, role: Role, ttl: Duration) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + ttl.num_seconds(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Token(format!("Failed to create token: {}", e)))
    }

    /// Verify signature, expiry and subject. All failures look the same.
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, InvalidToken> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                InvalidToken
            })?;

        if claims.sub.trim().is_empty() {
            tracing::debug!("Token rejected: empty subject");
            return Err(InvalidToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("unit-test-secret-unit-test-secret", Duration::minutes(60))
    }

    #[test]
    fn test_create_and_validate_token() {
        let tokens = issuer();
        let token = tokens.issue("alice", Role::Pathologist).expect("Failed to create token");
        let claims = tokens.verify(&token).expect("Failed to validate token");

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::Pathologist);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_invalid_token() {
        assert_eq!(issuer().verify("invalid.token.here"), Err(InvalidToken));
        assert_eq!(issuer().verify(""), Err(InvalidToken));
    }

    #[test]
    fn test_signature_mismatch() {
        let other = TokenIssuer::new("another-secret-entirely-different", Duration::minutes(5));
        let token = other.issue("alice", Role::Patient).unwrap();
        assert_eq!(issuer().verify(&token), Err(InvalidToken));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = issuer();
        let token = tokens
            .issue_with_ttl("alice", Role::Patient, Duration::seconds(-5))
            .unwrap();
        assert_eq!(tokens.verify(&token), Err(InvalidToken));
    }

    #[test]
    fn test_missing_subject_rejected() {
        let tokens = issuer();
        let exp = Utc::now().timestamp() + 600;
        let payload = serde_json::json!({ "role": "Patient", "iat": 0, "exp": exp });
        let token = encode(&Header::new(Algorithm::HS256), &payload, &tokens.encoding).unwrap();
        assert_eq!(tokens.verify(&token), Err(InvalidToken));

        let payload = serde_json::json!({ "sub": "", "role": "Patient", "iat": 0, "exp": exp });
        let token = encode(&Header::new(Algorithm::HS256), &payload, &tokens.encoding).unwrap();
        assert_eq!(tokens.verify(&token), Err(InvalidToken));
    }

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value(""), "NONE");
        assert_eq!(mask_value("short"), "****");
        assert_eq!(mask_value("abcdefghijklmnop"), "abcde...lmnop");
    }

    #[test]
    fn test_resolve_secret_precedence() {
        let s = resolve_secret(Some("from-config"), Some("from-env".into()), Environment::Development);
        assert_eq!(s.source, SecretSource::Config);
        assert_eq!(s.value, "from-config");

        let s = resolve_secret(Some("  "), Some("from-env".into()), Environment::Development);
        assert_eq!(s.source, SecretSource::Environment);
        assert_eq!(s.value, "from-env");

        let s = resolve_secret(None, None, Environment::Development);
        assert_eq!(s.source, SecretSource::Fallback);
        assert_eq!(s.value, DEV_FALLBACK_SECRET);
    }

    #[test]
    fn test_missing_production_secret_is_not_fatal() {
        let s = resolve_secret(None, Some(String::new()), Environment::Production);
        assert_eq!(s.source, SecretSource::Fallback);
        let tokens = TokenIssuer::new(&s.value, Duration::minutes(1));
        let token = tokens.issue("bob", Role::Patient).unwrap();
        assert!(tokens.verify(&token).is_ok());
    }
}
