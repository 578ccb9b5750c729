use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_finbot_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub assistant: AssistantSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSection {
    /// IANA timezone used to date transactions ("today")
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSection {
    /// When false the assistant runs on regex rules and canned replies only
    pub enabled: bool,
    /// "openai" or "anthropic"
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    pub json: bool,
}

impl Default for AssistantSection {
    fn default() -> Self {
        Self {
            timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com".to_string(),
            temperature: 0.3,
            timeout_secs: 8,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_finbot_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
