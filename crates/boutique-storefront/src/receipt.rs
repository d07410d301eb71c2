//! Order receipts.
//!
//! There is no order backend. A successful tokenization is recorded as a
//! receipt and logged, which is where a server call would go.

use boutique_commerce::cart::LineItem;
use boutique_commerce::checkout::OrderSummary;
use boutique_commerce::Money;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A confirmed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    /// One-time payment token issued by the gateway.
    pub token: String,
    pub lines: Vec<LineItem>,
    pub total: Money,
    pub confirmed_at: DateTime<Utc>,
}

impl OrderReceipt {
    /// Record a confirmation for `summary` as of now.
    pub fn new(token: impl Into<String>, summary: OrderSummary) -> Self {
        Self {
            token: token.into(),
            lines: summary.lines,
            total: summary.total,
            confirmed_at: Utc::now(),
        }
    }

    /// Token with everything but the last four characters masked, for logs.
    pub fn masked_token(&self) -> String {
        let visible: String = self
            .token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{visible}")
    }
}
