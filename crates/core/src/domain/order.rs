use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A customer order as held by the record store and written to snapshots.
///
/// Field names are the snapshot wire format. `address` is the only field with
/// a mutation path once the record is in a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub customer_name: String,
    pub items: Vec<String>,
    pub address: String,
    /// Free-text state such as `processing`, `shipped` or `delivered`.
    pub status: String,
    /// Written as an exact decimal string; numeric JSON is accepted on read.
    pub total_amount: Decimal,
    pub create_date: NaiveDate,
}

impl OrderRecord {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.order_id.0.trim().is_empty() {
            return Err(DomainError::InvalidOrderRecord(
                "order_id must not be empty".to_string(),
            ));
        }
        if self.total_amount < Decimal::ZERO {
            return Err(DomainError::InvalidOrderRecord(format!(
                "order `{}` has a negative total_amount ({})",
                self.order_id, self.total_amount
            )));
        }
        Ok(())
    }
}

impl fmt::Display for OrderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Order: {}", self.order_id)?;
        writeln!(f, "Customer: {}", self.customer_name)?;
        writeln!(f, "Items: {}", self.items.join(", "))?;
        writeln!(f, "Total: {:.2}", self.total_amount)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Address: {}", self.address)?;
        write!(f, "Order date: {}", self.create_date.format("%Y-%m-%d"))
    }
}
