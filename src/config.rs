use std::{env, path::PathBuf};

use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "http://localhost:30007";
pub const DEFAULT_SESSION_PATH: &str = ".storefront/session.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Url,
    pub timeout_secs: u64,
    pub session_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        let api_url = env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout_secs = match env::var("STOREFRONT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::Config(format!("STOREFRONT_TIMEOUT_SECS is not a number: {raw}")))?,
            Err(_) => 30,
        };
        let session_path = env::var("STOREFRONT_SESSION_PATH")
            .unwrap_or_else(|_| DEFAULT_SESSION_PATH.to_string());

        Self::new(&api_url, timeout_secs, session_path)
    }

    pub fn new(api_url: &str, timeout_secs: u64, session_path: impl Into<PathBuf>) -> AppResult<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| AppError::Config(format!("invalid API url '{api_url}': {e}")))?;
        if timeout_secs == 0 {
            return Err(AppError::Config("timeout must be at least one second".into()));
        }
        Ok(Self {
            api_url,
            timeout_secs,
            session_path: session_path.into(),
        })
    }
}
