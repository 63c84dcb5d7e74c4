use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub odoo_url: String,
    pub odoo_db: String,
    pub odoo_username: String,
    pub odoo_password: String,
    /// Name of the recruitment position that terminal verdicts are filed under.
    /// Must match an `hr.job` record by exact name.
    pub odoo_job_name: String,
    /// Upper bound on concurrent LLM calls across all pipeline stages.
    pub llm_concurrency: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            odoo_url: require_env("ODOO_URL")?,
            odoo_db: require_env("ODOO_DB")?,
            odoo_username: require_env("ODOO_USERNAME")?,
            odoo_password: require_env("ODOO_PASSWORD")?,
            odoo_job_name: require_env("ODOO_JOB_NAME")?,
            llm_concurrency: std::env::var("LLM_CONCURRENCY")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<usize>()
                .context("LLM_CONCURRENCY must be a positive integer")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
