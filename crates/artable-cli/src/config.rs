// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use artable_app::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::{self, LogLevel, LogSettings};

pub const APP_NAME: &str = "artable";
pub const CONFIG_PATH_ENV: &str = "ARTABLE_CONFIG_PATH";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(artable_api::DEFAULT_BASE_URL.to_owned()),
            page_size: Some(DEFAULT_PAGE_SIZE),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<LogLevel>,
    pub file: Option<String>,
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
                    "config file {} has no version. Add `version = 1` and keep values under [api] and [log]",
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
        if let Some(base_url) = &self.api.base_url {
            artable_api::validate_base_url(base_url.trim_end_matches('/'))
                .with_context(|| format!("invalid [api] section in {}", path.display()))?;
        }

        if let Some(page_size) = self.api.page_size
            && (page_size == 0 || page_size > MAX_PAGE_SIZE)
        {
            bail!(
                "api.page_size in {} must be between 1 and {}, got {}",
                path.display(),
                MAX_PAGE_SIZE,
                page_size
            );
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!(
                "log.file in {} must not be empty; remove it to use the default",
                path.display()
            );
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(artable_api::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn page_size(&self) -> u32 {
        self.api.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn log_settings(&self) -> Result<LogSettings> {
        let file = match &self.log.file {
            Some(file) => PathBuf::from(file),
            None => logging::default_log_path()?,
        };
        Ok(LogSettings {
            level: self.log.level.unwrap_or_default(),
            file,
        })
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# artable config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\n# Rows per page, 1 to {}\npage_size = {}\ntimeout = \"{}\"\n\n[log]\n# error, warn, info, debug or trace; {} overrides with a filter directive\nlevel = \"info\"\n# Optional. Default is platform data dir (for example ~/.local/share/artable/artable.log)\n# file = \"/absolute/path/to/artable.log\"\n",
            path.display(),
            artable_api::DEFAULT_BASE_URL,
            MAX_PAGE_SIZE,
            DEFAULT_PAGE_SIZE,
            DEFAULT_TIMEOUT,
            logging::LOG_FILTER_ENV,
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
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
