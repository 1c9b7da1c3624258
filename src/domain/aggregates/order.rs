//! Order Aggregate
//!
//! Orders arrive from the storefront backend as loosely typed JSON. [`RawOrder`]
//! mirrors that payload field for field; [`Order::from_raw`] is the only way a
//! raw record becomes a strict [`Order`].

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use crate::domain::value_objects::{parse_amount, parse_timestamp, ProofOfPayment};
use crate::{Result, RevenueError};

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    id: i64,
    status: OrderStatus,
    created_at: Option<DateTime<Utc>>,
    total_price: Decimal,
    proof_of_payment: Option<ProofOfPayment>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    /// Any status the storefront does not model. Kept so it still counts toward totals.
    Other(String),
}

impl OrderStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

/// An order record exactly as the backend serialises it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawOrder {
    #[serde(default)] pub id: Value,
    #[serde(default)] pub status: Value,
    #[serde(default)] pub created_at: Value,
    #[serde(default)] pub total_price: Value,
    #[serde(default)] pub proof_of_payment: Value,
}

impl Order {
    pub fn new(id: i64, status: OrderStatus, created_at: Option<DateTime<Utc>>, total_price: Decimal) -> Self {
        Self { id, status, created_at, total_price, proof_of_payment: None }
    }

    pub fn with_proof(mut self, proof: ProofOfPayment) -> Self { self.proof_of_payment = Some(proof); self }

    /// Converts a backend record, coercing malformed fields instead of failing.
    pub fn from_raw(raw: &RawOrder, tz: &Tz) -> Self {
        let id = match &raw.id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }.unwrap_or_else(|| { debug!(raw_id = %raw.id, "order id missing or not an integer"); 0 });

        let status = match &raw.status {
            Value::String(s) => OrderStatus::parse(s),
            other => { debug!(order_id = id, status = %other, "order status missing"); OrderStatus::Other(String::new()) }
        };

        let created_at = raw.created_at.as_str().and_then(|s| parse_timestamp(s, tz));
        if created_at.is_none() {
            debug!(order_id = id, created_at = %raw.created_at, "order timestamp unparsable, excluded from dated revenue");
        }

        let total_price = parse_amount(&raw.total_price).unwrap_or_else(|| {
            debug!(order_id = id, total_price = %raw.total_price, "order total unparsable, treated as zero");
            Decimal::ZERO
        });

        // only a non-blank string reference counts as paid
        let proof_of_payment = raw.proof_of_payment.as_str().and_then(|s| ProofOfPayment::new(s).ok());

        Self { id, status, created_at, total_price, proof_of_payment }
    }

    pub fn id(&self) -> i64 { self.id }
    pub fn status(&self) -> &OrderStatus { &self.status }
    pub fn created_at(&self) -> Option<DateTime<Utc>> { self.created_at }
    pub fn total_price(&self) -> Decimal { self.total_price }
    pub fn proof_of_payment(&self) -> Option<&ProofOfPayment> { self.proof_of_payment.as_ref() }

    pub fn is_paid(&self) -> bool { self.proof_of_payment.is_some() }
    pub fn is_completed(&self) -> bool { self.status == OrderStatus::Completed }
    pub fn is_cancelled(&self) -> bool { self.status == OrderStatus::Cancelled }

    /// Timestamp of an order eligible for headline revenue: paid, not cancelled, dated.
    pub fn revenue_timestamp(&self) -> Option<DateTime<Utc>> {
        if self.is_cancelled() || !self.is_paid() { return None; }
        self.created_at
    }
}

/// Parses a `GET orders/` response body. Entries that are not objects are skipped.
pub fn parse_orders(payload: &Value, tz: &Tz) -> Result<Vec<Order>> {
    let entries = payload.as_array().ok_or_else(|| RevenueError::MalformedPayload("expected a JSON array of orders".into()))?;
    let mut orders = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            warn!(index, "skipping order entry that is not an object");
            continue;
        }
        match RawOrder::deserialize(entry) {
            Ok(raw) => orders.push(Order::from_raw(&raw, tz)),
            Err(e) => warn!(index, error = %e, "skipping undecodable order entry"),
        }
    }
    Ok(orders)
}
