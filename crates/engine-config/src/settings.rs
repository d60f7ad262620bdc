use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How table data reaches the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// The extractor writes batch objects itself.
    Direct,
    /// One remote transfer job per table, driven by the job monitor.
    Managed,
}

/// Raw run settings as they appear in the plan file. Validated once at
/// load into [`ValidatedSettings`]; the core never re-checks them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub batch_size: usize,
    pub parallel_tables: usize,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    pub sample_size: usize,
    pub max_write_attempts: usize,
    pub transfer: TransferMode,
    pub float_tolerance: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            batch_size: 1000,
            parallel_tables: 4,
            poll_interval_secs: 15,
            max_wait_secs: 3600,
            sample_size: 100,
            max_write_attempts: 3,
            transfer: TransferMode::Direct,
            float_tolerance: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<ValidatedSettings, SettingsError> {
        if self.batch_size == 0 {
            return Err(SettingsError::InvalidSetting(
                "batch_size must be at least 1".into(),
            ));
        }
        if self.parallel_tables == 0 {
            return Err(SettingsError::InvalidSetting(
                "parallel_tables must be at least 1".into(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(SettingsError::InvalidSetting(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.max_wait_secs < self.poll_interval_secs {
            return Err(SettingsError::InvalidSetting(
                "max_wait_secs must not be smaller than poll_interval_secs".into(),
            ));
        }
        if self.max_write_attempts == 0 {
            return Err(SettingsError::InvalidSetting(
                "max_write_attempts must be at least 1".into(),
            ));
        }
        if let Some(tolerance) = self.float_tolerance
            && !(tolerance >= 0.0)
        {
            return Err(SettingsError::InvalidSetting(
                "float_tolerance must be a non-negative number".into(),
            ));
        }

        Ok(ValidatedSettings {
            batch_size: self.batch_size,
            parallel_tables: self.parallel_tables,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
            sample_size: self.sample_size,
            max_write_attempts: self.max_write_attempts,
            transfer: self.transfer,
            float_tolerance: self.float_tolerance,
        })
    }
}

/// Immutable, validated configuration used throughout the run.
///
/// `sample_size` of 0 turns validation into a count-only check.
#[derive(Debug, Clone)]
pub struct ValidatedSettings {
    pub batch_size: usize,
    pub parallel_tables: usize,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub sample_size: usize,
    pub max_write_attempts: usize,
    pub transfer: TransferMode,
    pub float_tolerance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let validated = Settings::default().validate().unwrap();
        assert_eq!(validated.batch_size, 1000);
        assert_eq!(validated.poll_interval, Duration::from_secs(15));
        assert_eq!(validated.transfer, TransferMode::Direct);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let settings = Settings {
            batch_size: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidSetting(_))
        ));
    }

    #[test]
    fn max_wait_below_poll_interval_is_rejected() {
        let settings = Settings {
            poll_interval_secs: 60,
            max_wait_secs: 30,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn nan_tolerance_is_rejected() {
        let settings = Settings {
            float_tolerance: Some(f64::NAN),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
