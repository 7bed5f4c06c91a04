//! Contracts for the external record stores the ledger reads from.
//!
//! Fetching itself lives outside this crate. A reader receives a [`ListFilter`],
//! applies it, sorts ascending by date and paginates its own stream before
//! anything is merged.

use crate::config::AggregatorConfig;
use crate::error::{LedgerError, Result};
use crate::schema::{ListRequest, PaymentDirection, RecordKind, SourceRecord};
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub customer_id: Option<i64>,
    pub car_number: Option<String>,
    /// Raw request text. Interpretation is left to the reader.
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub items_per_page: usize,
    /// 1-based.
    pub page_number: usize,
    pub include_items: bool,
}

impl ListFilter {
    pub fn from_request(request: &ListRequest, config: &AggregatorConfig) -> Result<Self> {
        let items_per_page = request
            .items_per_page
            .unwrap_or(config.default_items_per_page);
        let page_number = request.page_number.unwrap_or(config.default_page_number);

        if items_per_page == 0 {
            return Err(LedgerError::InvalidRequest(
                "itemsPerPage must be at least 1".to_string(),
            ));
        }
        if page_number == 0 {
            return Err(LedgerError::InvalidRequest(
                "pageNumber is 1-based".to_string(),
            ));
        }

        Ok(Self {
            customer_id: request.customer_id,
            car_number: request
                .car_car_number
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            from_date: request.from_date.clone(),
            to_date: request.to_date.clone(),
            items_per_page,
            page_number,
            include_items: request.include_items.unwrap_or(false),
        })
    }

    pub fn offset(&self) -> usize {
        self.page_number.saturating_sub(1).saturating_mul(self.items_per_page)
    }
}

/// One page of a single source, plus the number of rows matching before pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    pub total: usize,
    pub rows: Vec<SourceRecord>,
}

#[async_trait]
pub trait SourceReader: Send + Sync {
    fn kind(&self) -> RecordKind;

    /// Rows must come back in ascending date order.
    async fn fetch(&self, filter: &ListFilter) -> Result<SourcePage>;
}

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Aggregate payment sums used by the monthly rollup.
#[async_trait]
pub trait PaymentTotals: Send + Sync {
    /// Sum of payments flowing in `direction` within `window`.
    /// An empty `customer_ids` slice means every customer.
    async fn total(
        &self,
        direction: PaymentDirection,
        window: DateWindow,
        customer_ids: &[i64],
    ) -> Result<f64>;
}
