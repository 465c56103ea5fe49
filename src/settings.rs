use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TellerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub broker: BrokerSettings,
    #[serde(default)]
    pub categorization: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSettings {
    pub log_dir: String,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default)]
    pub offset_reset: OffsetReset,
}

/// Where a group starts reading when it has no committed offset yet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetReset {
    #[default]
    Earliest,
    Latest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_topic() -> String {
    "bank.transactions".to_string()
}

fn default_group_id() -> String {
    "teller-consumers".to_string()
}

fn default_poll_timeout_ms() -> u64 {
    3000
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("teller")
        .join("settings.json")
}

pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = path.map_or_else(default_config_path, Path::to_path_buf);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        TellerError::Config(format!("cannot read {}: {e}", path.display()))
    })?;
    let settings: Settings = serde_json::from_str(&content)
        .map_err(|e| TellerError::Config(format!("invalid {}: {e}", path.display())))?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Rejects configurations that would misbehave at runtime. Runs once at
    /// startup, before the consumer loop sees its first message.
    pub fn validate(&self) -> Result<()> {
        if self.db_path.trim().is_empty() {
            return Err(TellerError::Config("db_path must not be empty".into()));
        }
        if self.broker.log_dir.trim().is_empty() {
            return Err(TellerError::Config("broker.log_dir must not be empty".into()));
        }
        if self.broker.topic.trim().is_empty() {
            return Err(TellerError::Config("broker.topic must not be empty".into()));
        }
        if self.broker.group_id.trim().is_empty() {
            return Err(TellerError::Config("broker.group_id must not be empty".into()));
        }
        if self.broker.poll_timeout_ms == 0 {
            return Err(TellerError::Config("broker.poll_timeout_ms must be > 0".into()));
        }
        for (i, rule) in self.categorization.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(TellerError::Config(format!(
                    "categorization[{i}] has an empty name"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_json() -> &'static str {
        r#"{
            "db_path": "/tmp/teller.db",
            "broker": {"log_dir": "/tmp/teller-log"},
            "categorization": [
                {"name": "Groceries", "keywords": ["grocery", "supermarket"]},
                {"name": "Uncategorized"}
            ]
        }"#
    }

    #[test]
    fn test_parse_fills_broker_defaults() {
        let s: Settings = serde_json::from_str(base_json()).unwrap();
        assert_eq!(s.broker.topic, "bank.transactions");
        assert_eq!(s.broker.group_id, "teller-consumers");
        assert_eq!(s.broker.poll_timeout_ms, 3000);
        assert_eq!(s.broker.offset_reset, OffsetReset::Earliest);
    }

    #[test]
    fn test_missing_keywords_is_empty_list() {
        let s: Settings = serde_json::from_str(base_json()).unwrap();
        assert!(s.categorization[1].keywords.is_empty());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_offset_reset_latest() {
        let json = r#"{
            "db_path": "x.db",
            "broker": {"log_dir": "log", "offset_reset": "latest"}
        }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.broker.offset_reset, OffsetReset::Latest);
    }

    #[test]
    fn test_validate_rejects_blank_rule_name() {
        let json = r#"{
            "db_path": "x.db",
            "broker": {"log_dir": "log"},
            "categorization": [{"name": "  ", "keywords": ["a"]}]
        }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert!(matches!(s.validate(), Err(TellerError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_poll_timeout() {
        let json = r#"{
            "db_path": "x.db",
            "broker": {"log_dir": "log", "poll_timeout_ms": 0}
        }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert!(matches!(s.validate(), Err(TellerError::Config(_))));
    }

    #[test]
    fn test_load_settings_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, TellerError::Config(_)));
    }

    #[test]
    fn test_load_settings_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, base_json()).unwrap();
        let s = load_settings(Some(&path)).unwrap();
        assert_eq!(s.db_path, "/tmp/teller.db");
        assert_eq!(s.categorization.len(), 2);
    }
}
