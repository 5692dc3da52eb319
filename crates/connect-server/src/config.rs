use std::path::PathBuf;

use anyhow::{Context, bail};

/// Values from the sample `.env` that must be replaced before running.
const PLACEHOLDERS: &[&str] = &[
    "your-project-url",
    "https://your-project.supabase.co",
    "your-anon-key",
    "your-supabase-anon-key",
];

#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// Hosted PostgREST + GoTrue project.
    Rest { url: String, anon_key: String },
    /// Local SQLite file; bearer tokens are user ids.
    Local { db_path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: BackendConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("CONNECT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("CONNECT_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("CONNECT_PORT must be a port number")?;

        let backend = match var("CONNECT_BACKEND").as_deref().unwrap_or("rest") {
            "rest" => BackendConfig::Rest {
                url: required(&var, "SUPABASE_URL")?,
                anon_key: required(&var, "SUPABASE_ANON_KEY")?,
            },
            "local" => BackendConfig::Local {
                db_path: var("CONNECT_DB_PATH")
                    .unwrap_or_else(|| "connect.db".into())
                    .into(),
            },
            other => bail!("CONNECT_BACKEND must be \"rest\" or \"local\", got {:?}", other),
        };

        Ok(Self {
            host,
            port,
            backend,
        })
    }
}

fn required(var: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    let value = var(key).unwrap_or_default();
    if value.is_empty() || PLACEHOLDERS.contains(&value.as_str()) {
        bail!("{} is unset or still a placeholder; set it in your .env file", key);
    }
    Ok(value)
}
