//! API keys for the intent oracle, one per provider.
//!
//! Stored keys in `auth.json` win; otherwise the provider's environment
//! variable is used.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::llm::Provider;
use crate::state::ensure_finbot_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Credentials {
    #[serde(default)]
    keys: BTreeMap<String, String>,
}

impl Credentials {
    fn path() -> Result<PathBuf> {
        Ok(ensure_finbot_home()?.join("auth.json"))
    }

    pub fn load() -> Result<Self> {
        let p = Self::path()?;
        if !p.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
    }

    fn save(&self) -> Result<()> {
        let p = Self::path()?;
        fs::write(&p, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("write {}", p.display()))?;
        Ok(())
    }

    pub fn stored(&self, provider: Provider) -> Option<&str> {
        self.keys.get(provider.name()).map(String::as_str)
    }

    pub fn set(&mut self, provider: Provider, key: String) -> Result<()> {
        validate_key(provider, &key)?;
        self.keys.insert(provider.name().to_string(), key);
        Ok(())
    }

    /// Stored key, then `$<PROVIDER>_API_KEY`. Empty values count as missing.
    pub fn key_for(&self, provider: Provider) -> Option<String> {
        pick_key(self.stored(provider), std::env::var(provider.env_var()).ok())
    }
}

fn pick_key(stored: Option<&str>, env: Option<String>) -> Option<String> {
    stored
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or(env.filter(|k| !k.trim().is_empty()))
}

fn validate_key(provider: Provider, key: &str) -> Result<()> {
    let ok = match provider {
        Provider::OpenAI => key.starts_with("sk-") && !key.starts_with("sk-ant-"),
        Provider::Anthropic => key.starts_with("sk-ant-"),
    };
    if !ok {
        bail!(
            "that doesn't look like an {} key (expected prefix {})",
            provider.name(),
            provider.key_prefix()
        );
    }
    Ok(())
}

/// Read a key from stdin and store it for `provider`.
pub fn store_key_interactive(provider: Provider) -> Result<()> {
    print!("Paste {} API key ({}...): ", provider.name(), provider.key_prefix());
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    let mut creds = Credentials::load()?;
    creds.set(provider, line.trim().to_string())?;
    creds.save()?;
    println!("Saved {} key to auth.json", provider.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_key_wins_over_env() {
        assert_eq!(pick_key(Some("sk-a"), Some("sk-b".into())), Some("sk-a".into()));
        assert_eq!(pick_key(None, Some("sk-b".into())), Some("sk-b".into()));
        assert_eq!(pick_key(Some("  "), Some("sk-b".into())), Some("sk-b".into()));
        assert_eq!(pick_key(None, Some(String::new())), None);
    }

    #[test]
    fn test_set_validates_prefix_per_provider() {
        let mut creds = Credentials::default();
        assert!(creds.set(Provider::OpenAI, "sk-proj-123".into()).is_ok());
        assert!(creds.set(Provider::OpenAI, "sk-ant-123".into()).is_err());
        assert!(creds.set(Provider::Anthropic, "sk-proj-123".into()).is_err());
        assert!(creds.set(Provider::Anthropic, "sk-ant-123".into()).is_ok());
        assert_eq!(creds.stored(Provider::OpenAI), Some("sk-proj-123"));
        assert_eq!(creds.stored(Provider::Anthropic), Some("sk-ant-123"));
    }

    #[test]
    fn test_credentials_file_shape() {
        let mut creds = Credentials::default();
        creds.set(Provider::OpenAI, "sk-proj-123".into()).unwrap();
        let v = serde_json::to_value(&creds).unwrap();
        assert_eq!(v["keys"]["openai"], "sk-proj-123");
        let back: Credentials = serde_json::from_value(v).unwrap();
        assert_eq!(back, creds);
    }
}
