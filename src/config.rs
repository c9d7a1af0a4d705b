// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,

    /// Optional admin account seeded at startup.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,

    /// Outbound mail provider. When unset, notification endpoints report
    /// `skipped` instead of failing.
    pub mail_api_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: Option<String>,
    pub authority_email: Option<String>,

    /// Directory where uploaded profile photos are stored and served from.
    pub upload_dir: String,
    /// Base URL prefixed to returned upload paths.
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            mail_api_url: env::var("MAIL_API_URL").ok(),
            mail_api_key: env::var("MAIL_API_KEY").ok(),
            mail_from: env::var("MAIL_FROM").ok(),
            authority_email: env::var("AUTHORITY_EMAIL").ok(),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}
