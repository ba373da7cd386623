use crate::application_port::{RefreshConfig, RefreshFailurePolicy};
use crate::infra_http::ReqwestConfig;
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub backend: Backend,
    pub refresh: Refresh,
    pub session: Session,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Backend {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
pub struct Refresh {
    pub path: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub refresh_failure_policy: RefreshFailurePolicy,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

impl Settings {
    pub fn reqwest_config(&self) -> ReqwestConfig {
        ReqwestConfig {
            base_url: self.backend.base_url.clone(),
            request_timeout: Duration::from_secs(self.backend.request_timeout_secs),
            user_agent: self.backend.user_agent.clone(),
        }
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            path: self.refresh.path.clone(),
            timeout: Duration::from_secs(self.refresh.timeout_secs),
            failure_policy: self.session.refresh_failure_policy,
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Load settings from `path` (or the build's default file), then apply
/// `KOST__SECTION__KEY` environment overrides.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .set_default("backend.request_timeout_secs", 30_i64)?
        .set_default("backend.user_agent", concat!("kost-client/", env!("CARGO_PKG_VERSION")))?
        .set_default("refresh.path", "/auth/refresh")?
        .set_default("refresh.timeout_secs", 10_i64)?
        .set_default("session.refresh_failure_policy", "end_session")?
        .set_default("log.filter", "info")?
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("KOST").prefix_separator("__").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
