//! Bearer token validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{IdentityError, IdentityResult, DEFAULT_TOKEN_EXPIRATION_HOURS, DEFAULT_TOKEN_ISSUER};

/// Claims carried by identity-provider access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (opaque identity-provider user identifier).
    pub sub: String,
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// Issuer.
    pub iss: String,
    /// Token ID.
    pub jti: String,
}

impl Claims {
    /// Creates new claims for a subject.
    pub fn new(
        subject: impl Into<String>,
        email: impl Into<String>,
        name: Option<String>,
        expiration_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Self {
            sub: subject.into(),
            email: email.into(),
            name,
            picture: None,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: DEFAULT_TOKEN_ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = issuer.into();
        self
    }

    /// Returns true if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Token verification configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Shared secret for HS256 verification.
    pub secret: String,
    /// Token expiration in hours (used when issuing tokens, e.g. in tests).
    pub expiration_hours: u64,
    /// Expected issuer.
    pub issuer: String,
}

impl IdentityConfig {
    /// Creates a new configuration.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: DEFAULT_TOKEN_EXPIRATION_HOURS,
            issuer: DEFAULT_TOKEN_ISSUER.to_string(),
        }
    }

    /// Sets the expiration time in hours.
    pub fn with_expiration_hours(mut self, hours: u64) -> Self {
        self.expiration_hours = hours;
        self
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }
}

/// Validates identity-provider bearer tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    config: IdentityConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.config.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Creates a new token verifier.
    pub fn new(config: IdentityConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issues a token for a subject. Used by tests and local tooling; in
    /// production the identity provider mints the tokens.
    pub fn issue_token(
        &self,
        subject: impl Into<String>,
        email: impl Into<String>,
        name: Option<String>,
    ) -> IdentityResult<String> {
        let claims = Claims::new(subject, email, name, self.config.expiration_hours)
            .with_issuer(self.config.issuer.clone());

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| IdentityError::TokenEncoding(e.to_string()))
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> IdentityResult<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_issue_and_validation() {
        let config = IdentityConfig::new("test-secret-key-must-be-long-enough-for-security");
        let verifier = TokenVerifier::new(config);

        let token = verifier
            .issue_token(
                "provider|abc123",
                "test@example.com",
                Some("Test User".to_string()),
            )
            .unwrap();

        let claims = verifier.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "provider|abc123");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.name, Some("Test User".to_string()));
        assert_eq!(claims.iss, DEFAULT_TOKEN_ISSUER);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_custom_issuer_round_trip() {
        let config = IdentityConfig::new("shared-secret-long-enough-for-tests")
            .with_issuer("other-idp");
        let verifier = TokenVerifier::new(config);

        let token = verifier
            .issue_token("provider|abc", "test@example.com", None)
            .unwrap();
        let claims = verifier.validate_token(&token).unwrap();
        assert_eq!(claims.iss, "other-idp");
    }

    #[test]
    fn test_invalid_token() {
        let config = IdentityConfig::new("test-secret-key-must-be-long-enough-for-security");
        let verifier = TokenVerifier::new(config);

        assert!(verifier.validate_token("invalid-token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let verifier1 = TokenVerifier::new(IdentityConfig::new("secret-one-must-be-long-enough"));
        let verifier2 = TokenVerifier::new(IdentityConfig::new("secret-two-must-be-long-enough"));

        let token = verifier1
            .issue_token("provider|abc", "test@example.com", None)
            .unwrap();

        assert!(verifier2.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let issuing =
            IdentityConfig::new("shared-secret-long-enough-for-tests").with_issuer("other-idp");
        let verifying = IdentityConfig::new("shared-secret-long-enough-for-tests");

        let token = TokenVerifier::new(issuing)
            .issue_token("provider|abc", "test@example.com", None)
            .unwrap();

        assert!(TokenVerifier::new(verifying).validate_token(&token).is_err());
    }
}
