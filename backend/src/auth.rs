use crate::{config::JwtConfig, error::*, AppState};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user ID
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct AuthService {
    jwt_secret: String,
    jwt_expiration_hours: i64,
}

impl AuthService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            jwt_secret: config.secret.clone(),
            jwt_expiration_hours: config.expiration_hours,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }

    pub fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.jwt_expiration_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|token_data| token_data.claims)
        .map_err(|e| AppError::Auth(format!("Invalid or expired token: {}", e)))
    }

    pub fn extract_user_id_from_token(&self, token: &str) -> Result<Uuid> {
        let claims = self.verify_token(token)?;
        Uuid::parse_str(&claims.sub)
            .map_err(|e| AppError::Auth(format!("Invalid user ID in token: {}", e)))
    }
}

/// The caller behind a valid `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Auth("Missing bearer token".to_string()))?;
        let user_id = state.services.auth.extract_user_id_from_token(token)?;
        Ok(AuthUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn service(hours: i64) -> AuthService {
        AuthService::new(&JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: hours,
        })
    }

    #[test]
    fn password_hash_verifies() {
        let auth = service(1);
        let hashed = auth.hash_password("correct horse").unwrap();
        assert!(auth.verify_password("correct horse", &hashed).unwrap());
        assert!(!auth.verify_password("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn token_carries_user_id() {
        let auth = service(1);
        let user_id = Uuid::new_v4();
        let token = auth.generate_token(user_id, "a@b.test").unwrap();
        assert_eq!(auth.extract_user_id_from_token(&token).unwrap(), user_id);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let token = service(1).generate_token(Uuid::new_v4(), "a@b.test").unwrap();
        let other = AuthService::new(&JwtConfig {
            secret: "other-secret".to_string(),
            expiration_hours: 1,
        });
        assert!(matches!(other.verify_token(&token), Err(AppError::Auth(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = service(-2);
        let token = auth.generate_token(Uuid::new_v4(), "a@b.test").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn bearer_header_is_parsed() {
        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));

        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Basic dXNlcg==")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
