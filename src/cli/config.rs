use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Persisted CLI state: which server to talk to and the current session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub email: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            token: None,
            email: None,
        }
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("PROTEK_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME")
            .map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("protek")
    };
    Ok(config_dir)
}

fn config_path() -> anyhow::Result<PathBuf> {
    Ok(get_config_dir()?.join("config.json"))
}

pub fn load() -> anyhow::Result<CliConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(CliConfig::default());
    }
    let raw = fs::read_to_string(&path)?;
    let config = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("malformed config at {}: {}", path.display(), e))?;
    Ok(config)
}

pub fn save(config: &CliConfig) -> anyhow::Result<()> {
    let dir = get_config_dir()?;
    fs::create_dir_all(&dir)?;
    let path = dir.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

/// Base URL resolution order: flag, env, stored config, default.
pub fn resolve_base_url(flag: Option<&str>) -> anyhow::Result<String> {
    if let Some(url) = flag {
        return Ok(url.trim_end_matches('/').to_string());
    }
    if let Ok(url) = std::env::var("PROTEK_API_URL") {
        return Ok(url.trim_end_matches('/').to_string());
    }
    Ok(load()?.base_url.trim_end_matches('/').to_string())
}
