//! Authentication: portal session JWT validation and role lookup

use anyhow::{anyhow, Result};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::db::queries;
use crate::error::ApiError;
use crate::handlers::AppState;
use crate::types::UserRole;

/// Audience carried by signed-in user sessions
pub const SESSION_AUDIENCE: &str = "authenticated";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    /// Issued at (unix timestamp)
    #[serde(default)]
    pub iat: usize,
    /// Expiration (unix timestamp)
    pub exp: usize,
}

/// Validate a session token and return its claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SESSION_AUDIENCE]);

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| anyhow!("Invalid token: {}", e))?;

    Ok(token_data.claims)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Signed-in portal user
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".into()))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized)?;

        let claims = validate_token(token, &state.config.jwt_secret).map_err(|e| {
            debug!("Rejected session token: {}", e);
            ApiError::Unauthorized
        })?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

        // Users without a role row are plain project users
        let role = queries::role::get_role(&state.pool, user_id).await?.unwrap_or_default();

        Ok(AuthUser {
            user_id,
            email: claims.email,
            role,
        })
    }
}

/// Sign a session token the way the identity provider does
#[cfg(test)]
pub(crate) fn generate_token(user_id: Uuid, secret: &str, audience: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some("user@example.com".into()),
        aud: audience.to_string(),
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    #[test]
    fn token_round_trips_claims() {
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, SECRET, SESSION_AUDIENCE, 3600);
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = generate_token(Uuid::new_v4(), SECRET, SESSION_AUDIENCE, 3600);
        assert!(validate_token(&token, "another-secret-that-is-32-bytes-long!!").is_err());
    }

    #[test]
    fn token_for_other_audience_is_rejected() {
        let token = generate_token(Uuid::new_v4(), SECRET, "anon", 3600);
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = generate_token(Uuid::new_v4(), SECRET, SESSION_AUDIENCE, -3600);
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(validate_token("not.a.jwt", SECRET).is_err());
    }

    #[test]
    fn bearer_token_parsing() {
        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), Some("abc.def"));

        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn require_admin_rejects_agents() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: None,
            role: UserRole::Agent,
        };
        assert!(matches!(user.require_admin(), Err(ApiError::Forbidden(_))));
    }
}
