use std::env;

use crate::services::security::SecuritySettings;

/// Placeholder secret used when `EDUADMIN_JWT_SECRET` is unset
pub const DEV_JWT_SECRET: &str = "eduadmin-dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub bcrypt_cost: u32,
    /// Initial administrator created on an empty database
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let bootstrap_admin = match (
            env::var("EDUADMIN_ADMIN_USERNAME"),
            env::var("EDUADMIN_ADMIN_EMAIL"),
            env::var("EDUADMIN_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(BootstrapAdmin {
                username,
                email,
                password,
            }),
            _ => None,
        };

        Self {
            jwt_secret: env::var("EDUADMIN_JWT_SECRET")
                .unwrap_or_else(|_| DEV_JWT_SECRET.to_string()),
            access_token_ttl_secs: env::var("EDUADMIN_ACCESS_TOKEN_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            bcrypt_cost: env::var("EDUADMIN_BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            bootstrap_admin,
        }
    }

    pub fn security_settings(&self) -> SecuritySettings {
        SecuritySettings {
            jwt_secret: self.jwt_secret.clone(),
            access_token_ttl_secs: self.access_token_ttl_secs,
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}
