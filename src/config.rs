// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Number of chapters listed in each of the "time consuming" / "time efficient" rankings.
pub const TOP_TOPIC_COUNT: usize = 3;

/// Option slots available on a question (`option1` .. `option6`).
pub const MAX_OPTIONS: usize = 6;

/// Ceiling for any client-reported duration, per question or in total (one day).
pub const MAX_REPORTED_SECONDS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://quizmaster.db".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            server_port,
        }
    }
}
