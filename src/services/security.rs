//! Password hashing and access-token handling.
//!
//! Token issuance (login) lives outside this service; the API only needs to
//! validate bearer tokens and hash passwords set through the user handlers.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const TOKEN_ISSUER: &str = "eduadmin";

/// Immutable security settings shared through `AppState`
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub bcrypt_cost: u32,
}

impl SecuritySettings {
    /// Settings with the cheapest bcrypt cost, for tests and local tooling
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            access_token_ttl_secs: 3600,
            bcrypt_cost: 4,
        }
    }
}

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>, // "refresh" for refresh tokens
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }
}

/// Hash a password using bcrypt
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Create an HS256 access token for a user
pub fn create_access_token(settings: &SecuritySettings, user_id: i64) -> Result<String> {
    let now = Utc::now();
    let exp = now + Duration::seconds(settings.access_token_ttl_secs);

    let claims = Claims {
        sub: user_id.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
        token_type: None,
    };

    let key = EncodingKey::from_secret(settings.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| e.into())
}

/// Decode and validate an access token
pub fn decode_token(settings: &SecuritySettings, token: &str) -> Result<Claims> {
    let key = DecodingKey::from_secret(settings.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.leeway = 0;

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(token_data.claims)
}
