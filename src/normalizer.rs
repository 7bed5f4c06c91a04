use crate::schema::{PaymentRecord, SourceRecord, Transaction, TransactionType};
use crate::utils::short_date;
use chrono::{NaiveDateTime, Utc};
use log::warn;

/// Maps source records onto the canonical [`Transaction`] shape.
#[derive(Debug, Clone)]
pub struct Normalizer {
    short_date_format: String,
}

impl Normalizer {
    pub fn new(short_date_format: impl Into<String>) -> Self {
        Self {
            short_date_format: short_date_format.into(),
        }
    }

    /// Normalizes a batch, stamping undated records with a single processing time.
    pub fn normalize_all(&self, records: Vec<SourceRecord>) -> Vec<Transaction> {
        let now = Utc::now().naive_utc();
        records
            .into_iter()
            .map(|record| self.normalize_at(record, now))
            .collect()
    }

    /// `fallback` stands in for a missing record date.
    pub fn normalize_at(&self, record: SourceRecord, fallback: NaiveDateTime) -> Transaction {
        let transaction_type = TransactionType::from(record.kind());

        let transaction_date = record.date().unwrap_or_else(|| {
            warn!(
                "{} #{} has no date; using processing time {}",
                record.kind(),
                record.id(),
                fallback
            );
            fallback
        });

        let (customer_id, customer_name, order_amount, payment_amount) = match &record {
            SourceRecord::Order(order) => (
                order.customer_id,
                order.customer_name.clone(),
                order.amount,
                0.0,
            ),
            SourceRecord::Payment(payment) => (
                payment.customer_id,
                payment.customer_name.clone(),
                0.0,
                resolve_payment_amount(payment),
            ),
            SourceRecord::OrderDetail(detail) => (
                detail.customer_id,
                detail.customer_name.clone(),
                detail.amount,
                0.0,
            ),
            SourceRecord::PaymentDetail(detail) => (
                detail.customer_id,
                detail.customer_name.clone(),
                0.0,
                detail.amount,
            ),
        };

        Transaction {
            transaction_id: record.id(),
            customer_id,
            customer_name: customer_name.unwrap_or_default(),
            car_number: record.car_number().map(str::to_string),
            transaction_date,
            short_date: short_date(transaction_date, &self.short_date_format),
            transaction_type,
            transaction_type_id: transaction_type.type_id(),
            transaction_order_amount: order_amount,
            transaction_payment_amount: payment_amount,
            transaction_total: order_amount + payment_amount,
            transaction_data: record,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new("%Y-%m-%d")
    }
}

/// Attached line items win over the header amount; the header only counts when
/// there are none.
pub fn resolve_payment_amount(payment: &PaymentRecord) -> f64 {
    match payment.items.as_deref() {
        Some(items) if !items.is_empty() => items.iter().map(|item| item.amount).sum(),
        _ => payment.amount,
    }
}
