//! Issuance and verification of signed access and refresh tokens.
//!
//! The two token kinds are fully independent: distinct secrets, distinct
//! expiries, identical claim shape (`sub`, `iat`, `exp`). Verification is
//! pure computation with no store lookup, so a token stays valid until its
//! natural expiry; there is no revocation list at this layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

/// Which of the two independent token kinds a credential is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Short-lived, minutes-scale; authorizes request-scoped actions.
    Access,
    /// Longer-lived, days-scale; only ever exchanged for a new pair.
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// Errors raised by token issuance and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token's `exp` claim has passed.
    #[error("{kind} token has expired")]
    Expired { kind: TokenKind },
    /// Any structural or signature failure: wrong secret, tampered
    /// payload, malformed encoding, wrong kind, unparseable subject.
    #[error("{kind} token is invalid")]
    Invalid { kind: TokenKind },
    /// The signing operation itself failed.
    #[error("token could not be signed: {message}")]
    Signing { message: String },
}

/// Errors raised while validating a [`TokenConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenConfigError {
    #[error("{name} must not be empty")]
    EmptySecret { name: &'static str },
    #[error("access and refresh token secrets must differ")]
    IdenticalSecrets,
    #[error("{name} must be positive")]
    NonPositiveExpiry { name: &'static str },
}

/// Validated signing configuration for both token kinds.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    access_secret: String,
    refresh_secret: String,
    algorithm: Algorithm,
    access_expiry_minutes: i64,
    refresh_expiry_days: i64,
}

impl TokenConfig {
    /// Validate and construct a token configuration.
    ///
    /// The two secrets must be non-empty and must differ, so a token of one
    /// kind can never verify against the other kind's key.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        algorithm: Algorithm,
        access_expiry_minutes: i64,
        refresh_expiry_days: i64,
    ) -> Result<Self, TokenConfigError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.is_empty() {
            return Err(TokenConfigError::EmptySecret {
                name: "access token secret",
            });
        }
        if refresh_secret.is_empty() {
            return Err(TokenConfigError::EmptySecret {
                name: "refresh token secret",
            });
        }
        if access_secret == refresh_secret {
            return Err(TokenConfigError::IdenticalSecrets);
        }
        if access_expiry_minutes <= 0 {
            return Err(TokenConfigError::NonPositiveExpiry {
                name: "access token expiry (minutes)",
            });
        }
        if refresh_expiry_days <= 0 {
            return Err(TokenConfigError::NonPositiveExpiry {
                name: "refresh token expiry (days)",
            });
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            algorithm,
            access_expiry_minutes,
            refresh_expiry_days,
        })
    }
}

/// The claim set carried by both token kinds.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// A freshly minted access/refresh pair for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Mints and validates access and refresh tokens.
///
/// Issuance is a pure function of the supplied `now` and the configured
/// expiry; verification uses zero leeway.
pub struct TokenIssuer {
    header: Header,
    validation: Validation,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_expiry: Duration,
    refresh_expiry: Duration,
}

impl TokenIssuer {
    /// Build an issuer from a validated configuration.
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.leeway = 0;

        Self {
            header: Header::new(config.algorithm),
            validation,
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_expiry: Duration::minutes(config.access_expiry_minutes),
            refresh_expiry: Duration::days(config.refresh_expiry_days),
        }
    }

    /// Mint a token of the given kind for a subject, relative to `now`.
    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expiry = match kind {
            TokenKind::Access => self.access_expiry,
            TokenKind::Refresh => self.refresh_expiry,
        };
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + expiry).timestamp(),
        };
        encode(&self.header, &claims, self.encoding_key(kind)).map_err(|error| {
            TokenError::Signing {
                message: error.to_string(),
            }
        })
    }

    /// Mint a fresh access/refresh pair for a subject.
    pub fn issue_pair(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(TokenKind::Access, user_id, now)?,
            refresh: self.issue(TokenKind::Refresh, user_id, now)?,
        })
    }

    /// Validate a token of the given kind and return its subject.
    ///
    /// Fails closed: a token signed with the other kind's secret is
    /// [`TokenError::Invalid`], never accepted.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, self.decoding_key(kind), &self.validation)
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired { kind },
                _ => TokenError::Invalid { kind },
            })?;
        let subject =
            Uuid::from_str(&data.claims.sub).map_err(|_| TokenError::Invalid { kind })?;
        Ok(UserId::from_uuid(subject))
    }

    fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rstest::{fixture, rstest};

    use super::*;

    fn config() -> TokenConfig {
        TokenConfig::new(
            "access-secret-used-only-in-tests",
            "refresh-secret-used-only-in-tests",
            Algorithm::HS256,
            15,
            7,
        )
        .expect("valid config")
    }

    #[fixture]
    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&config())
    }

    #[rstest]
    #[case(TokenKind::Access)]
    #[case(TokenKind::Refresh)]
    fn round_trip_returns_subject(issuer: TokenIssuer, #[case] kind: TokenKind) {
        let user_id = UserId::random();
        let token = issuer.issue(kind, user_id, Utc::now()).expect("issues");
        assert_eq!(issuer.verify(&token, kind).expect("verifies"), user_id);
    }

    #[rstest]
    fn access_token_fails_against_refresh_secret(issuer: TokenIssuer) {
        let token = issuer
            .issue(TokenKind::Access, UserId::random(), Utc::now())
            .expect("issues");
        assert_eq!(
            issuer.verify(&token, TokenKind::Refresh).unwrap_err(),
            TokenError::Invalid {
                kind: TokenKind::Refresh
            }
        );
    }

    #[rstest]
    fn refresh_token_fails_against_access_secret(issuer: TokenIssuer) {
        let token = issuer
            .issue(TokenKind::Refresh, UserId::random(), Utc::now())
            .expect("issues");
        assert_eq!(
            issuer.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Invalid {
                kind: TokenKind::Access
            }
        );
    }

    #[rstest]
    fn expired_token_is_reported_as_expired(issuer: TokenIssuer) {
        // Issued far enough in the past that even the refresh expiry has
        // elapsed by the time we verify.
        let issued_at = Utc::now() - Duration::days(30);
        let token = issuer
            .issue(TokenKind::Access, UserId::random(), issued_at)
            .expect("issues");
        assert_eq!(
            issuer.verify(&token, TokenKind::Access).unwrap_err(),
            TokenError::Expired {
                kind: TokenKind::Access
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("not.a.token")]
    #[case("eyJhbGciOiJIUzI1NiJ9.tampered.signature")]
    fn malformed_tokens_are_invalid(issuer: TokenIssuer, #[case] token: &str) {
        assert_eq!(
            issuer.verify(token, TokenKind::Access).unwrap_err(),
            TokenError::Invalid {
                kind: TokenKind::Access
            }
        );
    }

    #[rstest]
    fn pair_shares_one_subject(issuer: TokenIssuer) {
        let user_id = UserId::random();
        let pair = issuer.issue_pair(user_id, Utc::now()).expect("issues");
        assert_eq!(
            issuer
                .verify(&pair.access, TokenKind::Access)
                .expect("verifies"),
            user_id
        );
        assert_eq!(
            issuer
                .verify(&pair.refresh, TokenKind::Refresh)
                .expect("verifies"),
            user_id
        );
    }

    #[rstest]
    fn identical_secrets_are_rejected() {
        assert_eq!(
            TokenConfig::new("same", "same", Algorithm::HS256, 15, 7).unwrap_err(),
            TokenConfigError::IdenticalSecrets
        );
    }

    #[rstest]
    fn non_positive_expiries_are_rejected() {
        assert!(matches!(
            TokenConfig::new("a", "b", Algorithm::HS256, 0, 7),
            Err(TokenConfigError::NonPositiveExpiry { .. })
        ));
        assert!(matches!(
            TokenConfig::new("a", "b", Algorithm::HS256, 15, -1),
            Err(TokenConfigError::NonPositiveExpiry { .. })
        ));
    }
}
