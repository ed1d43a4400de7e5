//! CLI Configuration
//!
//! The rules config lives in a TOML file. Keys are addressed with dots,
//! e.g. `contact_columns.account_id`.

use sase_subscription_rules::RulesConfig;
use std::path::{Path, PathBuf};
use toml::Value;

pub fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf, String> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let home = dirs::home_dir().ok_or("Cannot find home directory")?;
    Ok(home.join(".opensase").join("rules.toml"))
}

pub fn load(path: &Path) -> Result<RulesConfig, String> {
    tracing::debug!(path = %path.display(), "loading rules config");
    RulesConfig::load(path).map_err(|e| e.to_string())
}

pub fn save(config: &RulesConfig, path: &Path) -> Result<(), String> {
    config.save(path).map_err(|e| e.to_string())
}

fn to_value(config: &RulesConfig) -> Result<Value, String> {
    Value::try_from(config).map_err(|e| e.to_string())
}

pub fn get(config: &RulesConfig, key: &str) -> Result<String, String> {
    let root = to_value(config)?;
    let value = key
        .split('.')
        .try_fold(&root, |value, part| value.get(part))
        .ok_or_else(|| format!("Unknown config key: {}", key))?;
    Ok(display(value))
}

/// Replace one leaf value, keeping its type, and revalidate
pub fn set(config: &RulesConfig, key: &str, raw: &str) -> Result<RulesConfig, String> {
    let mut root = to_value(config)?;
    let slot = key
        .split('.')
        .try_fold(&mut root, |value, part| value.get_mut(part))
        .ok_or_else(|| format!("Unknown config key: {}", key))?;

    let invalid = |e: &dyn std::fmt::Display| format!("Invalid value for {}: {}", key, e);
    let replacement = match &*slot {
        Value::String(_) => Value::String(raw.to_string()),
        Value::Integer(_) => Value::Integer(raw.parse().map_err(|e| invalid(&e))?),
        Value::Float(_) => Value::Float(raw.parse().map_err(|e| invalid(&e))?),
        Value::Boolean(_) => Value::Boolean(raw.parse().map_err(|e| invalid(&e))?),
        _ => return Err(format!("{} is a section, set one of its keys", key)),
    };
    *slot = replacement;

    let updated: RulesConfig = root.try_into().map_err(|e: toml::de::Error| invalid(&e))?;
    updated.validate().map_err(|e| e.to_string())?;
    Ok(updated)
}

/// Every leaf as `(dotted key, value)`
pub fn entries(config: &RulesConfig) -> Result<Vec<(String, String)>, String> {
    let mut out = Vec::new();
    flatten("", &to_value(config)?, &mut out);
    Ok(out)
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Table(table) => {
            for (key, inner) in table {
                let key = if prefix.is_empty() { key.clone() } else { format!("{}.{}", prefix, key) };
                flatten(&key, inner, out);
            }
        }
        leaf => out.push((prefix.to_string(), display(leaf))),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
