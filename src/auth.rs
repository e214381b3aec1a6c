// src/auth.rs
//! Bearer-token identity: HS256 JWT with a `sub` claim naming the caller.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

pub const DEMO_IDENTITY: &str = "guest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// Turns a presented credential into an identity.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<String, AuthError>;
}

pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(1),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn create_token(&self, sub: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }
}

impl IdentityVerifier for JwtAuth {
    fn verify(&self, token: &str) -> Result<String, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => {
                    tracing::debug!(error = %e, "token rejected");
                    AuthError::Invalid
                }
            })
    }
}

/// Token part of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::Missing)?.trim();
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Missing)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Missing);
    }
    Ok(token)
}

/// Short anonymized fingerprint of an identity for logs.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_yields_subject() {
        let auth = JwtAuth::new("unit-test-secret");
        let token = auth.create_token("test-user").unwrap();
        assert_eq!(auth.verify(&token).unwrap(), "test-user");
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let auth = JwtAuth::new("unit-test-secret").with_ttl(Duration::seconds(-120));
        let token = auth.create_token("late").unwrap();
        assert_eq!(auth.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn wrong_secret_or_garbage_is_invalid() {
        let token = JwtAuth::new("secret-a").create_token("x").unwrap();
        assert_eq!(JwtAuth::new("secret-b").verify(&token), Err(AuthError::Invalid));
        assert_eq!(JwtAuth::new("secret-b").verify("not.a.jwt"), Err(AuthError::Invalid));
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("bearer   abc ")), Ok("abc"));
        assert_eq!(bearer_token(None), Err(AuthError::Missing));
        assert_eq!(bearer_token(Some("Basic abc")), Err(AuthError::Missing));
        assert_eq!(bearer_token(Some("Bearer")), Err(AuthError::Missing));
    }

    #[test]
    fn anon_hash_is_stable_and_short() {
        assert_eq!(anon_hash("guest"), anon_hash("guest"));
        assert_eq!(anon_hash("guest").len(), 12);
        assert_ne!(anon_hash("guest"), anon_hash("admin"));
    }
}
