use serde::{Deserialize, Serialize};

/// Per-table validation verdict. Computed once per run, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub table: String,
    pub source_count: u64,
    pub destination_count: u64,
    pub count_match: bool,
    pub sample_match: bool,
    pub validation_passed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn checked(
        table: &str,
        source_count: u64,
        destination_count: u64,
        sample_match: bool,
    ) -> Self {
        let count_match = source_count == destination_count;
        ValidationResult {
            table: table.to_string(),
            source_count,
            destination_count,
            count_match,
            sample_match,
            validation_passed: count_match && sample_match,
            error: None,
        }
    }

    /// Verdict for a table whose validation could not run at all.
    pub fn failed(table: &str, error: impl Into<String>) -> Self {
        ValidationResult {
            table: table.to_string(),
            source_count: 0,
            destination_count: 0,
            count_match: false,
            sample_match: false,
            validation_passed: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_is_the_conjunction_of_both_checks() {
        assert!(ValidationResult::checked("t", 3, 3, true).validation_passed);
        assert!(!ValidationResult::checked("t", 1000, 950, true).validation_passed);
        assert!(!ValidationResult::checked("t", 3, 3, false).validation_passed);
    }
}
