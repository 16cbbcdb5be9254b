use serde::{Deserialize, Serialize};

/// Configuration shared by the worker and ingest-api binaries.
///
/// Loaded once at startup from environment variables, each with a sensible
/// local-dev default, except `engine_status_secret`, which is fatal-at-startup
/// when unset and `production` is true (see [`EngineConfig::validate`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub redis_url: String,
    pub backend_base_url: String,
    pub engine_status_secret: Option<String>,
    pub database_url: Option<String>,
    pub smtp_port: u16,
    pub worker_concurrency: usize,
    pub max_retries: u32,
    pub production: bool,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost".to_string()),
            backend_base_url: std::env::var("BACKEND_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            engine_status_secret: std::env::var("ENGINE_STATUS_SECRET").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(465),
            worker_concurrency: std::env::var("WORKER_CONCURRENCY")
                .ok()
                .and_then(|n| n.parse().ok())
                .unwrap_or(1),
            max_retries: 3,
            production: std::env::var("ENVIRONMENT")
                .map(|e| e.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
        }
    }

    /// Fatal-at-startup configuration check: a production deployment without
    /// a configured status-update secret would silently fall back to session
    /// auth on the orchestrator side, which the worker can never satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.production && self.engine_status_secret.is_none() {
            return Err(
                "ENGINE_STATUS_SECRET must be set when ENVIRONMENT=production".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_without_secret_fails_validation() {
        let cfg = EngineConfig {
            redis_url: "redis://localhost".into(),
            backend_base_url: "http://localhost:8000".into(),
            engine_status_secret: None,
            database_url: None,
            smtp_port: 465,
            worker_concurrency: 1,
            max_retries: 3,
            production: true,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn dev_without_secret_is_fine() {
        let cfg = EngineConfig {
            production: false,
            ..EngineConfig {
                redis_url: "redis://localhost".into(),
                backend_base_url: "http://localhost:8000".into(),
                engine_status_secret: None,
                database_url: None,
                smtp_port: 465,
                worker_concurrency: 1,
                max_retries: 3,
                production: false,
            }
        };
        assert!(cfg.validate().is_ok());
    }
}
