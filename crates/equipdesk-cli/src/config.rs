// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use equipdesk_app::Role;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
const APP_NAME: &str = "equipdesk";
const DEFAULT_TIMEOUT: &str = "5s";
const DEFAULT_LOG_FILTER: &str = "warn";

pub const CONFIG_PATH_ENV: &str = "EQUIPDESK_CONFIG_PATH";
pub const SERVICE_URL_ENV: &str = "EQUIPDESK_SERVICE_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            service: Service::default(),
            access: Access::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Service {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Access {
    pub role: Option<String>,
}

impl Default for Access {
    fn default() -> Self {
        Self {
            role: Some(Role::Viewer.as_str().to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: Some(DEFAULT_LOG_FILTER.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and put values under [service], [access], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.service.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "service.base_url in {} is empty -- remove it or set a URL such as http://localhost:8080/api",
                path.display()
            );
        }

        if let Some(timeout) = &self.service.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("service.timeout in {}", path.display()))?;
            if parsed <= Duration::ZERO {
                bail!(
                    "service.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(role) = &self.access.role
            && Role::parse(role).is_none()
        {
            bail!(
                "access.role in {} must be \"admin\" or \"viewer\", got {:?}",
                path.display(),
                role
            );
        }

        Ok(())
    }

    /// Base URL from the file, else from the environment.
    pub fn base_url(&self) -> Option<String> {
        self.service
            .base_url
            .as_deref()
            .map(str::trim)
            .map(str::to_owned)
            .or_else(|| env::var(SERVICE_URL_ENV).ok())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.service.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn role(&self) -> Role {
        self.access
            .role
            .as_deref()
            .and_then(Role::parse)
            .unwrap_or(Role::Viewer)
    }

    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# equipdesk config\n# Place this file at: {}\n\nversion = 1\n\n[service]\n# Base URL of the record service; {} is used when unset\n# base_url = \"http://localhost:8080/api\"\ntimeout = \"{}\"\n\n[access]\n# admin may add, edit and delete records; viewer may only browse\nrole = \"viewer\"\n\n[log]\n# Overridden by EQUIPDESK_LOG\nfilter = \"{}\"\n",
            path.display(),
            SERVICE_URL_ENV,
            DEFAULT_TIMEOUT,
            DEFAULT_LOG_FILTER,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}

#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
