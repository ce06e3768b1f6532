//! Configuration module for the ResQ-Link backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Superuser login email
    pub admin_email: String,
    /// Superuser login password
    pub admin_password: String,
    /// Opaque bearer token issued to the superuser; recognized without a store lookup
    pub admin_token: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("RESQ_DB_PATH")
            .unwrap_or_else(|_| "./data/resqlink.sqlite".to_string())
            .into();

        let bind_addr = env::var("RESQ_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
            .parse()
            .expect("Invalid RESQ_BIND_ADDR format");

        let log_level = env::var("RESQ_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admin_email =
            env::var("RESQ_ADMIN_EMAIL").unwrap_or_else(|_| "admin@resqlink.com".to_string());
        let admin_password =
            env::var("RESQ_ADMIN_PASSWORD").unwrap_or_else(|_| "admin#123".to_string());
        let admin_token = env::var("RESQ_ADMIN_TOKEN")
            .unwrap_or_else(|_| format!("admin-{}", uuid::Uuid::new_v4()));

        Self {
            db_path,
            bind_addr,
            log_level,
            admin_email,
            admin_password,
            admin_token,
        }
    }
}
