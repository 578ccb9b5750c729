use anyhow::{Context, Result, bail};
use finbot_core::{MemStorage, UserId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// `$FINBOT_HOME`, or `~/.finbot`.
pub fn finbot_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINBOT_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finbot"))
}

pub fn ensure_finbot_home() -> Result<PathBuf> {
    let dir = finbot_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn ledger_path() -> Result<PathBuf> {
    Ok(ensure_finbot_home()?.join("ledger.json"))
}

pub fn load_ledger() -> Result<MemStorage> {
    MemStorage::load(&ledger_path()?)
}

pub fn save_ledger(store: &MemStorage) -> Result<()> {
    store.save(&ledger_path()?)
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    pub active_user: Option<UserId>,
}

pub fn profile_path() -> Result<PathBuf> {
    Ok(ensure_finbot_home()?.join("profile.json"))
}

pub fn write_profile(profile: &Profile) -> Result<()> {
    let p = profile_path()?;
    let json = serde_json::to_string_pretty(profile)?;
    fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn read_profile() -> Result<Profile> {
    let p = profile_path()?;
    if !p.exists() {
        return Ok(Profile::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(serde_json::from_str(&s)?)
}

/// `--user` wins over the active user in profile.json.
pub fn resolve_user(explicit: Option<UserId>) -> Result<UserId> {
    if let Some(id) = explicit {
        return Ok(id);
    }
    match read_profile()?.active_user {
        Some(id) => Ok(id),
        None => bail!("No active user. Run: finbot user add --name <name> --email <email>"),
    }
}
