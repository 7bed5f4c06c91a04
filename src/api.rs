//! JSON request handling for the ledger and rollup endpoints.
//!
//! Transport is left to the host application; these functions take the decoded
//! POST body and return the JSON to send back. Failures become
//! `{"success": false, "message": ...}`.

use crate::aggregator::{LedgerAggregator, LedgerMode};
use crate::error::{LedgerError, Result};
use crate::schema::{FailureResponse, LedgerPage, ListRequest, MonthlyRollupPoint, RollupRequest};
use log::{error, warn};
use serde::Deserialize;
use serde_json::Value;

pub const GROUPED_TRANSACTIONS: &str = "GetGroupedTransactionsList";
pub const DETAILED_TRANSACTIONS: &str = "GetDetailedTransactionsList";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    req_type: Option<String>,
    #[serde(default)]
    req_object: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRequest {
    Grouped(ListRequest),
    Detailed(ListRequest),
}

impl LedgerRequest {
    /// Validates the envelope without touching any reader.
    pub fn parse(body: &Value) -> Result<Self> {
        let envelope: Envelope = serde_json::from_value(body.clone())
            .map_err(|e| LedgerError::InvalidRequest(format!("Malformed request: {}", e)))?;

        let req_type = envelope
            .req_type
            .ok_or_else(|| LedgerError::InvalidRequest("reqType is required".to_string()))?;

        let mode = match req_type.as_str() {
            GROUPED_TRANSACTIONS => LedgerMode::Grouped,
            DETAILED_TRANSACTIONS => LedgerMode::Detailed,
            _ => return Err(LedgerError::UnknownRequestType(req_type)),
        };

        if envelope.req_object.is_null() {
            return Err(LedgerError::MissingRequestObject(req_type));
        }

        let request: ListRequest = serde_json::from_value(envelope.req_object).map_err(|e| {
            LedgerError::InvalidRequest(format!("Malformed reqObject for {}: {}", req_type, e))
        })?;

        Ok(match mode {
            LedgerMode::Grouped => LedgerRequest::Grouped(request),
            LedgerMode::Detailed => LedgerRequest::Detailed(request),
        })
    }

    pub fn mode(&self) -> LedgerMode {
        match self {
            LedgerRequest::Grouped(_) => LedgerMode::Grouped,
            LedgerRequest::Detailed(_) => LedgerMode::Detailed,
        }
    }

    pub fn list_request(&self) -> &ListRequest {
        match self {
            LedgerRequest::Grouped(request) | LedgerRequest::Detailed(request) => request,
        }
    }
}

pub async fn dispatch_ledger_request(
    aggregator: &LedgerAggregator,
    body: &Value,
) -> Result<LedgerPage> {
    let request = LedgerRequest::parse(body)?;
    aggregator
        .list_transactions(request.mode(), request.list_request())
        .await
}

pub async fn dispatch_rollup_request(
    aggregator: &LedgerAggregator,
    body: &Value,
) -> Result<Vec<MonthlyRollupPoint>> {
    let request: RollupRequest = serde_json::from_value(body.clone())
        .map_err(|e| LedgerError::InvalidRequest(format!("Malformed rollup request: {}", e)))?;
    aggregator.monthly_rollup(&request).await
}

pub async fn handle_ledger_request(aggregator: &LedgerAggregator, body: &Value) -> Value {
    respond(dispatch_ledger_request(aggregator, body).await)
}

pub async fn handle_rollup_request(aggregator: &LedgerAggregator, body: &Value) -> Value {
    respond(dispatch_rollup_request(aggregator, body).await)
}

/// Raw-body variant of [`handle_ledger_request`].
pub async fn handle_ledger_body(aggregator: &LedgerAggregator, body: &str) -> String {
    let response = match serde_json::from_str::<Value>(body) {
        Ok(value) => handle_ledger_request(aggregator, &value).await,
        Err(e) => failure(&LedgerError::InvalidRequest(format!(
            "Request body is not JSON: {}",
            e
        ))),
    };
    response.to_string()
}

fn respond<T: serde::Serialize>(result: Result<T>) -> Value {
    match result.and_then(|payload| serde_json::to_value(payload).map_err(LedgerError::from)) {
        Ok(value) => value,
        Err(e) => failure(&e),
    }
}

fn failure(err: &LedgerError) -> Value {
    if err.is_client_error() {
        warn!("Rejected request: {}", err);
    } else {
        error!("Request failed: {}", err);
    }
    serde_json::to_value(FailureResponse::new(err.to_string()))
        .unwrap_or_else(|_| serde_json::json!({ "success": false, "message": err.to_string() }))
}
