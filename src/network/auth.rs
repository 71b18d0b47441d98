//! Token Authentication
//!
//! Validates the opaque bearer token presented in the WebSocket handshake.
//! The server never issues tokens — the HTTP auth surface does that; this
//! side only checks the HS256 signature and expiry and extracts the
//! subject the connection will be bound to.

use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer. Unset means every
    /// connection stays unauthenticated.
    pub secret: Option<String>,
    /// Whether to skip expiry validation (testing only).
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Read `AUTH_TOKEN_SECRET` / `AUTH_SKIP_EXPIRY` from the environment.
    pub fn from_env() -> Self {
        Self {
            secret: std::env::var("AUTH_TOKEN_SECRET").ok(),
            skip_expiry: std::env::var("AUTH_SKIP_EXPIRY")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Whether token validation is possible at all.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }
}

/// Claims carried by the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — the player id the connection authenticates as.
    pub sub: String,
    /// Expiry timestamp (Unix seconds).
    #[serde(default)]
    pub exp: u64,
    /// Issued at timestamp.
    #[serde(default)]
    pub iat: u64,
    /// Display name hint, if the issuer includes one.
    #[serde(default)]
    pub name: Option<String>,
}

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No secret configured on the server.
    #[error("authentication not configured")]
    NotConfigured,
    /// Token format is invalid.
    #[error("invalid token format")]
    InvalidFormat,
    /// Token signature verification failed.
    #[error("invalid signature")]
    InvalidSignature,
    /// Token has expired.
    #[error("token expired")]
    Expired,
    /// Required claim is missing.
    #[error("missing required claim: {0}")]
    MissingClaim(String),
    /// Other decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),
}

/// Validate a bearer token and extract its claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let secret = config.secret.as_ref().ok_or(AuthError::NotConfigured)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims = std::collections::HashSet::new();
    if config.skip_expiry {
        validation.validate_exp = false;
    }

    let key = DecodingKey::from_secret(secret.as_bytes());
    let token_data: TokenData<TokenClaims> =
        decode(token, &key, &validation).map_err(map_jwt_error)?;
    let claims = token_data.claims;

    if claims.sub.is_empty() {
        return Err(AuthError::MissingClaim("sub".into()));
    }

    // Manual expiry check in case the spec-claim validation was relaxed.
    if !config.skip_expiry && claims.exp > 0 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
    }

    Ok(claims)
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
        _ => AuthError::DecodeError(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn create_test_token(claims: &TokenClaims, secret: &str) -> String {
        let header = Header::new(Algorithm::HS256);
        let key = EncodingKey::from_secret(secret.as_bytes());
        encode(&header, claims, &key).unwrap()
    }

    fn test_claims() -> TokenClaims {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        TokenClaims {
            sub: "player-123".into(),
            exp: now + 3600,
            iat: now,
            name: Some("Alice".into()),
        }
    }

    #[test]
    fn test_valid_token_validation() {
        let secret = "test-secret-key-256-bits-long!!";
        let token = create_test_token(&test_claims(), secret);
        let config = AuthConfig {
            secret: Some(secret.into()),
            ..Default::default()
        };

        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "player-123");
        assert_eq!(claims.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = "test-secret-key-256-bits-long!!";
        let mut claims = test_claims();
        claims.exp = 1;
        let token = create_test_token(&claims, secret);
        let config = AuthConfig {
            secret: Some(secret.into()),
            ..Default::default()
        };

        assert!(matches!(
            validate_token(&token, &config),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let token = create_test_token(&test_claims(), "correct-secret-here!!!!!!!!");
        let config = AuthConfig {
            secret: Some("wrong-secret-here!!!!!!!!!!".into()),
            ..Default::default()
        };

        assert!(matches!(
            validate_token(&token, &config),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn test_missing_sub_rejected() {
        let secret = "test-secret-key-256-bits-long!!";
        let mut claims = test_claims();
        claims.sub = String::new();
        let token = create_test_token(&claims, secret);
        let config = AuthConfig {
            secret: Some(secret.into()),
            ..Default::default()
        };

        assert!(matches!(
            validate_token(&token, &config),
            Err(AuthError::MissingClaim(_))
        ));
    }

    #[test]
    fn test_not_configured_error() {
        let config = AuthConfig::default();
        assert!(matches!(
            validate_token("some.jwt.token", &config),
            Err(AuthError::NotConfigured)
        ));
    }

    #[test]
    fn test_skip_expiry_for_testing() {
        let secret = "test-secret-key-256-bits-long!!";
        let mut claims = test_claims();
        claims.exp = 1;
        let token = create_test_token(&claims, secret);
        let config = AuthConfig {
            secret: Some(secret.into()),
            skip_expiry: true,
        };

        assert!(validate_token(&token, &config).is_ok());
    }
}
