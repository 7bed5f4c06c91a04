//! In-process record store implementing every reader contract.
//!
//! Behaves the way the storage layer does: filters, sorts ascending by date,
//! then paginates each stream on its own.

use crate::error::Result;
use crate::schema::{
    OrderDetailRecord, OrderRecord, PaymentDetailRecord, PaymentDirection, PaymentRecord,
    RecordKind, SourceRecord,
};
use crate::sources::{DateWindow, ListFilter, PaymentTotals, SourcePage, SourceReader};
use crate::utils::parse_timestamp;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    orders: Vec<OrderRecord>,
    payments: Vec<PaymentRecord>,
    order_details: Vec<OrderDetailRecord>,
    payment_details: Vec<PaymentDetailRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_order(&mut self, order: OrderRecord) -> &mut Self {
        self.orders.push(order);
        self
    }

    pub fn add_payment(&mut self, payment: PaymentRecord) -> &mut Self {
        self.payments.push(payment);
        self
    }

    pub fn add_order_detail(&mut self, detail: OrderDetailRecord) -> &mut Self {
        self.order_details.push(detail);
        self
    }

    pub fn add_payment_detail(&mut self, detail: PaymentDetailRecord) -> &mut Self {
        self.payment_details.push(detail);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn records(&self, kind: RecordKind, include_items: bool) -> Vec<SourceRecord> {
        match kind {
            RecordKind::Order => self
                .orders
                .iter()
                .cloned()
                .map(|mut order| {
                    if !include_items {
                        order.items = None;
                    }
                    SourceRecord::Order(order)
                })
                .collect(),
            RecordKind::Payment => self
                .payments
                .iter()
                .cloned()
                .map(|mut payment| {
                    if !include_items {
                        payment.items = None;
                    }
                    SourceRecord::Payment(payment)
                })
                .collect(),
            RecordKind::OrderDetail => self
                .order_details
                .iter()
                .cloned()
                .map(SourceRecord::OrderDetail)
                .collect(),
            RecordKind::PaymentDetail => self
                .payment_details
                .iter()
                .cloned()
                .map(SourceRecord::PaymentDetail)
                .collect(),
        }
    }

    fn query(&self, kind: RecordKind, filter: &ListFilter) -> SourcePage {
        let bounds = match DayBounds::parse(filter) {
            Some(bounds) => bounds,
            None => {
                debug!("{} query has an unreadable date bound; returning no rows", kind);
                return SourcePage::default();
            }
        };

        let mut matched: Vec<SourceRecord> = self
            .records(kind, filter.include_items)
            .into_iter()
            .filter(|record| filter.customer_id.map_or(true, |id| record.customer_id() == id))
            .filter(|record| matches_car_number(record, filter.car_number.as_deref()))
            .filter(|record| bounds.admits(record))
            .collect();

        matched.sort_by_key(|record| (record.date(), record.id()));

        let total = matched.len();
        let rows = matched
            .into_iter()
            .skip(filter.offset())
            .take(filter.items_per_page)
            .collect();

        SourcePage { total, rows }
    }
}

/// The vehicle filter only narrows order-kind streams; payments carry no vehicle.
fn matches_car_number(record: &SourceRecord, needle: Option<&str>) -> bool {
    let needle = match needle {
        Some(n) => n.to_lowercase(),
        None => return true,
    };
    match record.kind() {
        RecordKind::Payment | RecordKind::PaymentDetail => true,
        RecordKind::Order | RecordKind::OrderDetail => record
            .car_number()
            .map_or(false, |car| car.to_lowercase().contains(&needle)),
    }
}

struct DayBounds {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DayBounds {
    /// `None` when a bound is present but unreadable.
    fn parse(filter: &ListFilter) -> Option<Self> {
        let read = |raw: &Option<String>| -> Option<Option<NaiveDate>> {
            match raw.as_deref().map(str::trim) {
                None | Some("") => Some(None),
                Some(text) => parse_timestamp(text).map(|ts| Some(ts.date())),
            }
        };
        Some(Self {
            from: read(&filter.from_date)?,
            to: read(&filter.to_date)?,
        })
    }

    fn admits(&self, record: &SourceRecord) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        match record.date() {
            Some(ts) => {
                let day = ts.date();
                self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
            }
            None => false,
        }
    }
}

/// Exposes one stream of an [`InMemoryStore`] as a [`SourceReader`].
#[derive(Debug, Clone)]
pub struct MemoryReader {
    store: Arc<InMemoryStore>,
    kind: RecordKind,
}

impl MemoryReader {
    pub fn new(store: Arc<InMemoryStore>, kind: RecordKind) -> Self {
        Self { store, kind }
    }
}

#[async_trait]
impl SourceReader for MemoryReader {
    fn kind(&self) -> RecordKind {
        self.kind
    }

    async fn fetch(&self, filter: &ListFilter) -> Result<SourcePage> {
        Ok(self.store.query(self.kind, filter))
    }
}

#[async_trait]
impl PaymentTotals for InMemoryStore {
    async fn total(
        &self,
        direction: PaymentDirection,
        window: DateWindow,
        customer_ids: &[i64],
    ) -> Result<f64> {
        Ok(self
            .payments
            .iter()
            .filter(|p| p.direction == direction)
            .filter(|p| customer_ids.is_empty() || customer_ids.contains(&p.customer_id))
            .filter(|p| p.date.map_or(false, |ts| window.contains(ts.date())))
            .map(|p| p.amount)
            .sum())
    }
}
