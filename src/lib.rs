//! # Transaction Ledger
//!
//! Builds one deterministic transaction timeline out of independently stored,
//! independently paginated order and payment streams, and computes monthly
//! income/outcome/profit rollups for dashboards.
//!
//! ## Core Concepts
//!
//! - **Source Readers**: external stores returning filtered, paginated, date-ascending
//!   records for one record kind ([`SourceReader`]). [`InMemoryStore`] is a reference
//!   implementation.
//! - **Normalizer**: maps every record kind onto the canonical [`Transaction`].
//! - **Ledger order**: `(transactionDate, transactionTypeId, transactionId)` ascending,
//!   independent of the order the sources were fetched in.
//! - **Buckets**: optional grouping by date, customer or type, in first-seen order.
//! - **Rollup**: one [`MonthlyRollupPoint`] per calendar month, oldest first.
//!
//! ## Example
//!
//! ```rust,ignore
//! use transaction_ledger::*;
//!
//! let mut store = InMemoryStore::new();
//! store.add_order(order).add_payment(payment);
//!
//! let aggregator = LedgerAggregator::from_store(store.into_shared(), AggregatorConfig::default())?;
//! let page = aggregator
//!     .grouped_transactions(&ListRequest {
//!         group_by: Some(GroupBy::Customer),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod grouping;
pub mod memory;
pub mod merger;
pub mod normalizer;
pub mod rollup;
pub mod schema;
pub mod sources;
pub mod utils;

pub use aggregator::{LedgerAggregator, LedgerMode, SourceSet};
pub use api::{
    dispatch_ledger_request, dispatch_rollup_request, handle_ledger_body, handle_ledger_request,
    handle_rollup_request, LedgerRequest, DETAILED_TRANSACTIONS, GROUPED_TRANSACTIONS,
};
pub use config::AggregatorConfig;
pub use error::{LedgerError, Result};
pub use grouping::{bucket_key, group_ledger};
pub use memory::{InMemoryStore, MemoryReader};
pub use merger::{ledger_order, merge_ledger, merge_sorted, sort_ledger};
pub use normalizer::{resolve_payment_amount, Normalizer};
pub use rollup::RollupEngine;
pub use schema::*;
pub use sources::{DateWindow, ListFilter, PaymentTotals, SourcePage, SourceReader};
