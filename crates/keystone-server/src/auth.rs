//! Bearer token authentication for `/api` routes.
//!
//! Tokens are HS256 JWTs carrying a subject and an expiry. When
//! authentication is disabled every request passes through unchanged.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Subject of a verified token, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub subject: String,
}

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
        let claims = Claims {
            sub: subject.to_string(),
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth").field("algorithm", &"HS256").finish()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware guarding routes behind a valid bearer token.
pub async fn require_bearer(
    State(auth): State<Option<Arc<JwtAuth>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(auth) = auth else {
        return next.run(request).await;
    };

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        return ApiError::Unauthorized("Authentication required".to_string()).into_response();
    };

    match auth.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthenticatedUser {
                subject: claims.sub,
            });
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Bearer token authentication failed");
            ApiError::Unauthorized("Invalid or expired credentials".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let auth = JwtAuth::new("secret");
        let token = auth.issue("admin", Duration::hours(1)).unwrap();
        assert_eq!(auth.verify(&token).unwrap().sub, "admin");
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let token = JwtAuth::new("one").issue("admin", Duration::hours(1)).unwrap();
        assert!(JwtAuth::new("two").verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired() {
        let auth = JwtAuth::new("secret");
        let token = auth.issue("admin", Duration::hours(-2)).unwrap();
        assert!(auth.verify(&token).is_err());
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
