use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four record streams a ledger can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RecordKind {
    Order,
    Payment,
    OrderDetail,
    PaymentDetail,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Order => "Order",
            RecordKind::Payment => "Payment",
            RecordKind::OrderDetail => "OrderDetail",
            RecordKind::PaymentDetail => "PaymentDetail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum TransactionType {
    Order,
    Payment,
    OrderDetailed,
    PaymentDetailed,
}

impl TransactionType {
    /// Fixed tie-break priority. Never business data.
    pub fn type_id(self) -> u8 {
        match self {
            TransactionType::Order => 1,
            TransactionType::Payment => 2,
            TransactionType::OrderDetailed => 3,
            TransactionType::PaymentDetailed => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionType::Order => "Order",
            TransactionType::Payment => "Payment",
            TransactionType::OrderDetailed => "OrderDetailed",
            TransactionType::PaymentDetailed => "PaymentDetailed",
        }
    }
}

impl From<RecordKind> for TransactionType {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Order => TransactionType::Order,
            RecordKind::Payment => TransactionType::Payment,
            RecordKind::OrderDetail => TransactionType::OrderDetailed,
            RecordKind::PaymentDetail => TransactionType::PaymentDetailed,
        }
    }
}

/// Whether a payment brings money in or pays it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PaymentDirection {
    Income,
    Outcome,
}

impl Default for PaymentDirection {
    fn default() -> Self {
        Self::Income
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub product_name: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub car_number: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentItem {
    pub id: i64,
    pub description: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub date: Option<NaiveDateTime>,
    /// Header amount. Only authoritative when no line items are attached.
    pub amount: f64,
    #[serde(default)]
    pub direction: PaymentDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<PaymentItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailRecord {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub car_number: Option<String>,
    pub product_name: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailRecord {
    pub id: i64,
    pub payment_id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub direction: PaymentDirection,
    pub amount: f64,
    pub date: Option<NaiveDateTime>,
}

/// A raw record as handed over by a source reader, reference names already resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum SourceRecord {
    Order(OrderRecord),
    Payment(PaymentRecord),
    OrderDetail(OrderDetailRecord),
    PaymentDetail(PaymentDetailRecord),
}

impl SourceRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            SourceRecord::Order(_) => RecordKind::Order,
            SourceRecord::Payment(_) => RecordKind::Payment,
            SourceRecord::OrderDetail(_) => RecordKind::OrderDetail,
            SourceRecord::PaymentDetail(_) => RecordKind::PaymentDetail,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            SourceRecord::Order(r) => r.id,
            SourceRecord::Payment(r) => r.id,
            SourceRecord::OrderDetail(r) => r.id,
            SourceRecord::PaymentDetail(r) => r.id,
        }
    }

    pub fn customer_id(&self) -> i64 {
        match self {
            SourceRecord::Order(r) => r.customer_id,
            SourceRecord::Payment(r) => r.customer_id,
            SourceRecord::OrderDetail(r) => r.customer_id,
            SourceRecord::PaymentDetail(r) => r.customer_id,
        }
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        match self {
            SourceRecord::Order(r) => r.date,
            SourceRecord::Payment(r) => r.date,
            SourceRecord::OrderDetail(r) => r.date,
            SourceRecord::PaymentDetail(r) => r.date,
        }
    }

    /// Only order-kind records can be linked to a vehicle.
    pub fn car_number(&self) -> Option<&str> {
        match self {
            SourceRecord::Order(r) => r.car_number.as_deref(),
            SourceRecord::OrderDetail(r) => r.car_number.as_deref(),
            SourceRecord::Payment(_) | SourceRecord::PaymentDetail(_) => None,
        }
    }
}

/// Canonical ledger entry. Built by the normalizer, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_number: Option<String>,
    pub transaction_date: NaiveDateTime,
    pub short_date: String,
    pub transaction_type: TransactionType,
    pub transaction_type_id: u8,
    pub transaction_order_amount: f64,
    pub transaction_payment_amount: f64,
    pub transaction_total: f64,
    pub transaction_data: SourceRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum GroupBy {
    #[serde(rename = "None", alias = "")]
    None,
    Date,
    Customer,
    TransactionType,
}

impl Default for GroupBy {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GroupedBucket {
    pub key: String,
    pub items: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LedgerRows {
    Timeline(Vec<Transaction>),
    Buckets(Vec<GroupedBucket>),
}

impl LedgerRows {
    /// Number of transactions, counting through buckets.
    pub fn transaction_count(&self) -> usize {
        match self {
            LedgerRows::Timeline(rows) => rows.len(),
            LedgerRows::Buckets(buckets) => buckets.iter().map(|b| b.items.len()).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPage {
    pub total_length: usize,
    pub rows_list: LedgerRows,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRollupPoint {
    pub month_label: String,
    pub total_incomes: f64,
    pub total_outcomes: f64,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ListRequest {
    #[schemars(description = "Only include records of this customer")]
    pub customer_id: Option<i64>,

    #[schemars(description = "Vehicle number text filter, applied by the source readers")]
    pub car_car_number: Option<String>,

    #[schemars(
        description = "Start of the date range. Passed to the source readers uninterpreted"
    )]
    pub from_date: Option<String>,

    #[schemars(description = "End of the date range. Passed to the source readers uninterpreted")]
    pub to_date: Option<String>,

    #[schemars(description = "Page size, applied to each source independently")]
    pub items_per_page: Option<usize>,

    #[schemars(description = "1-based page number, applied to each source independently")]
    pub page_number: Option<usize>,

    #[schemars(description = "Attach nested line items to header records")]
    pub include_items: Option<bool>,

    #[schemars(description = "Bucket the merged timeline by this dimension. Empty means no grouping")]
    pub group_by: Option<GroupBy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RollupRequest {
    #[schemars(description = "Comma separated customer ids. Empty means all customers")]
    pub customer_ids: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl ListRequest {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ListRequest)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}

impl LedgerPage {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(LedgerPage)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::generate_json_schema())
    }
}
