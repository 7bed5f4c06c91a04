use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for a [`crate::LedgerAggregator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Page size used when a request leaves `itemsPerPage` out.
    pub default_items_per_page: usize,
    /// 1-based.
    pub default_page_number: usize,
    /// chrono format for the calendar-day `shortDate` key.
    pub short_date_format: String,
    pub month_label_format: String,
    /// Month windows queried at once by the rollup. 1 keeps them sequential.
    pub rollup_concurrency: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            default_items_per_page: 10,
            default_page_number: 1,
            short_date_format: "%Y-%m-%d".to_string(),
            month_label_format: "%m/%Y".to_string(),
            rollup_concurrency: 1,
        }
    }
}

impl AggregatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_items_per_page == 0 {
            return Err(LedgerError::InvalidConfig(
                "default_items_per_page must be at least 1".to_string(),
            ));
        }
        if self.default_page_number == 0 {
            return Err(LedgerError::InvalidConfig(
                "default_page_number is 1-based and must be at least 1".to_string(),
            ));
        }
        if self.rollup_concurrency == 0 {
            return Err(LedgerError::InvalidConfig(
                "rollup_concurrency must be at least 1".to_string(),
            ));
        }
        if self.short_date_format.trim().is_empty() || self.month_label_format.trim().is_empty()
        {
            return Err(LedgerError::InvalidConfig(
                "date formats must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
