//! Server configuration.

use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database URL.
    pub database_url: String,
    /// Shared secret for validating identity-provider tokens.
    pub jwt_secret: String,
    /// Emails granted the admin role on first access.
    pub admin_emails: Vec<String>,
    /// Vision model API key; AI features are disabled when absent.
    pub gemini_api_key: Option<String>,
    /// Vision model name.
    pub gemini_model: Option<String>,
    /// Log level.
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("DRIVELINE_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("DRIVELINE_JWT_SECRET is required"))?;

        let admin_emails = env::var("DRIVELINE_ADMIN_EMAILS")
            .map(|v| {
                v.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: env::var("DRIVELINE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("DRIVELINE_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:driveline.db?mode=rwc".to_string()),
            jwt_secret,
            admin_emails,
            gemini_api_key: env::var("DRIVELINE_GEMINI_API_KEY").ok(),
            gemini_model: env::var("DRIVELINE_GEMINI_MODEL").ok(),
            log_level: env::var("DRIVELINE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true if the email is on the admin allow-list.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e == &email.to_lowercase())
    }

    /// Returns true if AI features are configured.
    pub fn ai_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}
