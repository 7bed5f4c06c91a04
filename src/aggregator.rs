use crate::config::AggregatorConfig;
use crate::error::{LedgerError, Result};
use crate::grouping::group_ledger;
use crate::memory::{InMemoryStore, MemoryReader};
use crate::merger::merge_ledger;
use crate::normalizer::Normalizer;
use crate::rollup::RollupEngine;
use crate::schema::{LedgerPage, ListRequest, MonthlyRollupPoint, RecordKind, RollupRequest};
use crate::sources::{ListFilter, PaymentTotals, SourcePage, SourceReader};
use crate::utils::{parse_customer_ids, parse_request_date};
use log::{debug, error, info};
use std::sync::Arc;

/// Which pair of streams a listing merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Order and payment headers.
    Grouped,
    /// Order and payment line items.
    Detailed,
}

impl LedgerMode {
    pub fn kinds(self) -> (RecordKind, RecordKind) {
        match self {
            LedgerMode::Grouped => (RecordKind::Order, RecordKind::Payment),
            LedgerMode::Detailed => (RecordKind::OrderDetail, RecordKind::PaymentDetail),
        }
    }
}

/// The reader capabilities an aggregator is built on.
#[derive(Clone)]
pub struct SourceSet {
    pub orders: Arc<dyn SourceReader>,
    pub payments: Arc<dyn SourceReader>,
    pub order_details: Arc<dyn SourceReader>,
    pub payment_details: Arc<dyn SourceReader>,
    pub totals: Arc<dyn PaymentTotals>,
}

impl SourceSet {
    pub fn from_store(store: Arc<InMemoryStore>) -> Self {
        Self {
            orders: Arc::new(MemoryReader::new(store.clone(), RecordKind::Order)),
            payments: Arc::new(MemoryReader::new(store.clone(), RecordKind::Payment)),
            order_details: Arc::new(MemoryReader::new(store.clone(), RecordKind::OrderDetail)),
            payment_details: Arc::new(MemoryReader::new(store.clone(), RecordKind::PaymentDetail)),
            totals: store,
        }
    }

    fn reader(&self, kind: RecordKind) -> &Arc<dyn SourceReader> {
        match kind {
            RecordKind::Order => &self.orders,
            RecordKind::Payment => &self.payments,
            RecordKind::OrderDetail => &self.order_details,
            RecordKind::PaymentDetail => &self.payment_details,
        }
    }
}

/// Builds ledgers and rollups from a fixed set of readers.
///
/// Constructed once and shared by request handlers. Holds no mutable state, so
/// concurrent requests need no coordination.
#[derive(Clone)]
pub struct LedgerAggregator {
    sources: SourceSet,
    normalizer: Normalizer,
    rollup: RollupEngine,
    config: AggregatorConfig,
}

impl LedgerAggregator {
    pub fn new(sources: SourceSet, config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        for kind in [
            RecordKind::Order,
            RecordKind::Payment,
            RecordKind::OrderDetail,
            RecordKind::PaymentDetail,
        ] {
            let actual = sources.reader(kind).kind();
            if actual != kind {
                return Err(LedgerError::InvalidConfig(format!(
                    "{} reader slot holds a {} reader",
                    kind, actual
                )));
            }
        }

        Ok(Self {
            normalizer: Normalizer::new(config.short_date_format.clone()),
            rollup: RollupEngine::new(sources.totals.clone(), &config),
            sources,
            config,
        })
    }

    pub fn from_store(store: Arc<InMemoryStore>, config: AggregatorConfig) -> Result<Self> {
        Self::new(SourceSet::from_store(store), config)
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub async fn grouped_transactions(&self, request: &ListRequest) -> Result<LedgerPage> {
        self.list_transactions(LedgerMode::Grouped, request).await
    }

    pub async fn detailed_transactions(&self, request: &ListRequest) -> Result<LedgerPage> {
        self.list_transactions(LedgerMode::Detailed, request).await
    }

    /// Fetches both streams of `mode` at once, then normalizes, merges and groups them.
    ///
    /// Each stream is paginated by its reader before the merge, so one page can
    /// hold up to twice `itemsPerPage` rows. `totalLength` is the sum of both
    /// readers' unpaginated match counts.
    pub async fn list_transactions(
        &self,
        mode: LedgerMode,
        request: &ListRequest,
    ) -> Result<LedgerPage> {
        let filter = ListFilter::from_request(request, &self.config)?;
        let group_by = request.group_by.unwrap_or_default();
        let (first_kind, second_kind) = mode.kinds();

        info!(
            "Listing {:?} ledger (customer {:?}, page {} x {}, group by {:?})",
            mode, filter.customer_id, filter.page_number, filter.items_per_page, group_by
        );

        let (first, second) = futures::try_join!(
            self.fetch(first_kind, &filter),
            self.fetch(second_kind, &filter)
        )?;

        debug!(
            "Fetched {} {} row(s) of {} and {} {} row(s) of {}",
            first.rows.len(),
            first_kind,
            first.total,
            second.rows.len(),
            second_kind,
            second.total
        );

        let total_length = first.total + second.total;
        let ledger = merge_ledger(
            self.normalizer.normalize_all(first.rows),
            self.normalizer.normalize_all(second.rows),
        );
        let rows_list = group_ledger(ledger, group_by);

        Ok(LedgerPage {
            total_length,
            rows_list,
        })
    }

    async fn fetch(&self, kind: RecordKind, filter: &ListFilter) -> Result<SourcePage> {
        self.sources.reader(kind).fetch(filter).await.map_err(|e| {
            error!("{} reader failed: {}", kind, e);
            if matches!(e, LedgerError::SourceFetch { .. }) {
                e
            } else {
                LedgerError::fetch(kind, e.to_string())
            }
        })
    }

    /// Monthly income/outcome/profit for the rollup endpoint.
    ///
    /// Missing dates produce an empty result; unreadable ones are rejected.
    pub async fn monthly_rollup(&self, request: &RollupRequest) -> Result<Vec<MonthlyRollupPoint>> {
        let customer_ids = parse_customer_ids(request.customer_ids.as_deref())?;
        let from = parse_request_date(request.from_date.as_deref())?;
        let to = parse_request_date(request.to_date.as_deref())?;

        self.rollup.rollup(from, to, &customer_ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        GroupBy, LedgerRows, OrderDetailRecord, OrderRecord, PaymentDetailRecord,
        PaymentDirection, PaymentItem, PaymentRecord, TransactionType,
    };
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32, h: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0)
    }

    fn store() -> Arc<InMemoryStore> {
        let mut store = InMemoryStore::new();
        store
            .add_order(OrderRecord {
                id: 5,
                customer_id: 1,
                customer_name: Some("Baltic Freight".to_string()),
                car_number: Some("LV-1001".to_string()),
                date: at(2024, 1, 1, 0),
                amount: 400.0,
                items: None,
            })
            .add_payment(PaymentRecord {
                id: 3,
                customer_id: 1,
                customer_name: Some("Baltic Freight".to_string()),
                date: at(2024, 1, 1, 0),
                amount: 100.0,
                direction: PaymentDirection::Income,
                items: Some(vec![
                    PaymentItem { id: 1, description: None, amount: 40.0 },
                    PaymentItem { id: 2, description: None, amount: 50.0 },
                ]),
            })
            .add_order_detail(OrderDetailRecord {
                id: 50,
                order_id: 5,
                customer_id: 1,
                customer_name: Some("Baltic Freight".to_string()),
                car_number: Some("LV-1001".to_string()),
                product_name: Some("Crushed stone".to_string()),
                quantity: 4.0,
                unit_price: 100.0,
                amount: 400.0,
                date: at(2024, 1, 1, 0),
            })
            .add_payment_detail(PaymentDetailRecord {
                id: 30,
                payment_id: 3,
                customer_id: 1,
                customer_name: Some("Baltic Freight".to_string()),
                description: None,
                direction: PaymentDirection::Income,
                amount: 40.0,
                date: at(2024, 1, 1, 0),
            });
        store.into_shared()
    }

    fn timeline(page: LedgerPage) -> Vec<(TransactionType, i64, f64)> {
        match page.rows_list {
            LedgerRows::Timeline(rows) => rows
                .into_iter()
                .map(|t| (t.transaction_type, t.transaction_id, t.transaction_total))
                .collect(),
            LedgerRows::Buckets(_) => panic!("expected a flat timeline"),
        }
    }

    #[tokio::test]
    async fn test_grouped_mode_merges_headers() {
        let aggregator = LedgerAggregator::from_store(store(), AggregatorConfig::default()).unwrap();
        let request = ListRequest {
            include_items: Some(true),
            ..Default::default()
        };
        let page = aggregator.grouped_transactions(&request).await.unwrap();

        assert_eq!(page.total_length, 2);
        assert_eq!(
            timeline(page),
            vec![
                (TransactionType::Order, 5, 400.0),
                (TransactionType::Payment, 3, 90.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_header_amount_used_without_items() {
        let aggregator = LedgerAggregator::from_store(store(), AggregatorConfig::default()).unwrap();
        let page = aggregator
            .grouped_transactions(&ListRequest::default())
            .await
            .unwrap();
        assert_eq!(timeline(page)[1], (TransactionType::Payment, 3, 100.0));
    }

    #[tokio::test]
    async fn test_detailed_mode_merges_line_items() {
        let aggregator = LedgerAggregator::from_store(store(), AggregatorConfig::default()).unwrap();
        let page = aggregator
            .detailed_transactions(&ListRequest::default())
            .await
            .unwrap();
        assert_eq!(
            timeline(page),
            vec![
                (TransactionType::OrderDetailed, 50, 400.0),
                (TransactionType::PaymentDetailed, 30, 40.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_grouping_applied() {
        let aggregator = LedgerAggregator::from_store(store(), AggregatorConfig::default()).unwrap();
        let request = ListRequest {
            group_by: Some(GroupBy::Customer),
            ..Default::default()
        };
        let page = aggregator.grouped_transactions(&request).await.unwrap();
        match page.rows_list {
            LedgerRows::Buckets(buckets) => {
                assert_eq!(buckets.len(), 1);
                assert_eq!(buckets[0].key, "Baltic Freight");
                assert_eq!(buckets[0].items.len(), 2);
            }
            LedgerRows::Timeline(_) => panic!("expected buckets"),
        }
    }

    struct FailingReader(RecordKind);

    #[async_trait]
    impl SourceReader for FailingReader {
        fn kind(&self) -> RecordKind {
            self.0
        }

        async fn fetch(&self, _filter: &ListFilter) -> Result<SourcePage> {
            Err(LedgerError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )))
        }
    }

    #[tokio::test]
    async fn test_one_failing_reader_fails_the_request() {
        let mut sources = SourceSet::from_store(store());
        sources.payments = Arc::new(FailingReader(RecordKind::Payment));
        let aggregator = LedgerAggregator::new(sources, AggregatorConfig::default()).unwrap();

        let err = aggregator
            .grouped_transactions(&ListRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::SourceFetch {
                kind: RecordKind::Payment,
                ..
            }
        ));
        assert!(!err.is_client_error());

        // Detailed mode does not touch the broken reader.
        assert!(aggregator
            .detailed_transactions(&ListRequest::default())
            .await
            .is_ok());
    }

    #[test]
    fn test_rejects_miswired_readers() {
        let mut sources = SourceSet::from_store(store());
        sources.orders = Arc::new(FailingReader(RecordKind::Payment));
        assert!(matches!(
            LedgerAggregator::new(sources, AggregatorConfig::default()),
            Err(LedgerError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_monthly_rollup_request_parsing() {
        let aggregator = LedgerAggregator::from_store(store(), AggregatorConfig::default()).unwrap();

        let points = aggregator
            .monthly_rollup(&RollupRequest {
                customer_ids: Some("1".to_string()),
                from_date: Some("2024-01-01".to_string()),
                to_date: Some("2024-01-31".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].month_label, "01/2024");
        assert_eq!(points[0].total_incomes, 100.0);

        let points = aggregator
            .monthly_rollup(&RollupRequest {
                customer_ids: None,
                from_date: Some("2024-01-01".to_string()),
                to_date: None,
            })
            .await
            .unwrap();
        assert!(points.is_empty());

        let err = aggregator
            .monthly_rollup(&RollupRequest {
                customer_ids: Some("abc".to_string()),
                from_date: None,
                to_date: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
