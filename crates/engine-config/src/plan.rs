use crate::{
    error::SettingsError,
    settings::{Settings, TransferMode, ValidatedSettings},
};
use model::source::TableSource;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// A fully parsed migration plan: where the data lives, where it goes,
/// and how to move it. This is the strongly-typed replacement for the
/// loosely-typed config files the core must never see.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationPlan {
    pub source: SourceConfig,
    pub destination: StoreConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferConfig>,

    pub tables: Vec<TableSource>,

    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase", deny_unknown_fields)]
pub enum SourceConfig {
    Mysql {
        url: String,
    },
    Postgres {
        url: String,
    },
    /// Inline dataset, served from memory. Used by dry-run rehearsals
    /// and demo plans.
    Memory {
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum StoreConfig {
    /// Locally mounted container directory.
    Fs { root: PathBuf },
    /// Storage gateway in front of a cloud container.
    Http { endpoint: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransferConfig {
    pub endpoint: String,
}

pub fn parse(json: &str) -> Result<MigrationPlan, SettingsError> {
    Ok(serde_json::from_str(json)?)
}

impl MigrationPlan {
    /// Cross-field validation, run once before any table work starts.
    pub fn validate(&self) -> Result<ValidatedSettings, SettingsError> {
        let settings = self.settings.validate()?;

        if self.tables.is_empty() {
            return Err(SettingsError::NoTables);
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.table.as_str()) {
                return Err(SettingsError::DuplicateTable(table.table.clone()));
            }
        }

        if settings.transfer == TransferMode::Managed && self.transfer.is_none() {
            return Err(SettingsError::MissingTransferEndpoint);
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_PLAN: &str = r#"{
        "source": { "format": "postgres", "url": "postgres://localhost/app" },
        "destination": { "kind": "fs", "root": "/tmp/landing" },
        "tables": [ { "table": "orders" } ]
    }"#;

    #[test]
    fn minimal_plan_parses_and_validates() {
        let plan = parse(MINIMAL_PLAN).unwrap();
        let settings = plan.validate().unwrap();
        assert_eq!(settings.batch_size, 1000);
        assert_eq!(plan.tables[0].table, "orders");
    }

    #[test]
    fn duplicate_tables_are_rejected() {
        let json = r#"{
            "source": { "format": "postgres", "url": "postgres://localhost/app" },
            "destination": { "kind": "fs", "root": "/tmp/landing" },
            "tables": [ { "table": "orders" }, { "table": "orders" } ]
        }"#;
        let plan = parse(json).unwrap();
        assert!(matches!(
            plan.validate(),
            Err(SettingsError::DuplicateTable(t)) if t == "orders"
        ));
    }

    #[test]
    fn managed_mode_requires_an_endpoint() {
        let json = r#"{
            "source": { "format": "postgres", "url": "postgres://localhost/app" },
            "destination": { "kind": "fs", "root": "/tmp/landing" },
            "tables": [ { "table": "orders" } ],
            "settings": { "transfer": "managed" }
        }"#;
        let plan = parse(json).unwrap();
        assert!(matches!(
            plan.validate(),
            Err(SettingsError::MissingTransferEndpoint)
        ));
    }

    #[test]
    fn unknown_fields_fail_parsing() {
        let json = r#"{
            "source": { "format": "postgres", "url": "postgres://localhost/app" },
            "destination": { "kind": "fs", "root": "/tmp/landing" },
            "tables": [ { "table": "orders" } ],
            "surprise": true
        }"#;
        assert!(matches!(parse(json), Err(SettingsError::Parse(_))));
    }
}
