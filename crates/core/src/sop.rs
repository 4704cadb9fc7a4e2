//! Standard operating procedures used as generation context.
//!
//! The registry is built once at startup (built-in text or files named in
//! configuration) and handed to the components that need it. There is no
//! mutation path after construction.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SopConfig;

pub const ORDER_SOP: &str = "\
ORDER HANDLING DECISION TREE

1. Work out what the customer needs: order status, an address change, a cancellation,
   a payment or refund question, or something else.

2. Order status
   2.1 Status is \"processing\": the order is being prepared in the warehouse and ships
       within 48 hours of purchase. Share the expected ship window.
   2.2 Status is \"shipped\": the parcel is with the courier. Delivery normally takes
       2-4 days. Offer to pass delivery questions to the logistics team.
   2.3 Status is \"delivered\": confirm the delivery and ask whether everything arrived
       in good condition.

3. Address change
   3.1 Status is \"processing\": the address can still be changed. Ask for the complete
       new address (street, district, city) and confirm it back to the customer.
   3.2 Status is \"shipped\" or \"delivered\": the address can no longer be changed.
       Explain this and suggest contacting the courier to redirect the parcel.

4. Cancellation
   4.1 Status is \"processing\": the order can be cancelled. The refund goes back to the
       original payment method within 3-5 business days.
   4.2 Status is \"shipped\": the order cannot be cancelled in transit. The customer can
       refuse the delivery or start a return once it arrives.
   4.3 Status is \"delivered\": direct the customer to the 7-day no-questions return policy.

5. Payment and refunds
   5.1 Quote the order total from the order record when asked about charges.
   5.2 Refunds for cancelled or returned orders take 3-5 business days after approval.

6. Anything else
   6.1 If the request is unclear, ask one short clarifying question.
   6.2 If the request cannot be handled by these rules, offer to transfer the customer
       to a human agent.
";

pub const LOGISTICS_SOP: &str = "\
LOGISTICS HANDLING DECISION TREE

1. Work out the delivery concern: delivery time, tracking, a changed delivery address,
   a parcel marked delivered but not received, or a damaged parcel.

2. Delivery time
   2.1 Not yet shipped: orders ship within 48 hours of purchase.
   2.2 Shipped: delivery normally takes 2-4 days; remote areas may take up to 7 days.

3. Tracking
   3.1 Share the courier and tracking number from the order record when available.
   3.2 If tracking has not updated for more than 48 hours, open a trace request with the
       courier and tell the customer to expect an update within 24 hours.

4. Delivery address
   4.1 Before shipment: the address can be changed by the order team.
   4.2 After shipment: the customer must contact the courier to redirect the parcel.

5. Marked delivered but not received
   5.1 Ask the customer to check with neighbours, the building reception and parcel lockers.
   5.2 If the parcel is still missing after 24 hours, open a lost-parcel claim and offer a
       replacement or a full refund once the claim is confirmed.

6. Damaged parcel
   6.1 Ask for photos of the parcel and the items.
   6.2 Offer a replacement or a refund; the customer does not need to return damaged items.

7. Anything else
   7.1 Offer to transfer the customer to a human agent.
";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SopKind {
    Order,
    Logistics,
}

impl SopKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Logistics => "logistics",
        }
    }
}

impl fmt::Display for SopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SopKind {
    type Err = SopError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "order" => Ok(Self::Order),
            "logistics" => Ok(Self::Logistics),
            other => Err(SopError::InvalidCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum SopError {
    #[error("invalid sop category `{0}` (expected order|logistics)")]
    InvalidCategory(String),
    #[error("could not read sop file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("sop file `{0}` is empty")]
    EmptyFile(PathBuf),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SopRegistry {
    order: String,
    logistics: String,
}

impl Default for SopRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SopRegistry {
    pub fn new(order: impl Into<String>, logistics: impl Into<String>) -> Self {
        Self { order: order.into(), logistics: logistics.into() }
    }

    pub fn builtin() -> Self {
        Self::new(ORDER_SOP, LOGISTICS_SOP)
    }

    /// Builds the registry from configuration, falling back to the built-in
    /// text for any procedure without a configured file.
    pub fn from_config(config: &SopConfig) -> Result<Self, SopError> {
        let order = match &config.order_path {
            Some(path) => read_sop_file(path)?,
            None => ORDER_SOP.to_string(),
        };
        let logistics = match &config.logistics_path {
            Some(path) => read_sop_file(path)?,
            None => LOGISTICS_SOP.to_string(),
        };
        Ok(Self { order, logistics })
    }

    pub fn get(&self, kind: SopKind) -> &str {
        match kind {
            SopKind::Order => &self.order,
            SopKind::Logistics => &self.logistics,
        }
    }

    pub fn lookup(&self, category: &str) -> Result<&str, SopError> {
        let kind = category.parse::<SopKind>()?;
        Ok(self.get(kind))
    }
}

fn read_sop_file(path: &Path) -> Result<String, SopError> {
    let text = fs::read_to_string(path)
        .map_err(|source| SopError::ReadFile { path: path.to_path_buf(), source })?;
    if text.trim().is_empty() {
        return Err(SopError::EmptyFile(path.to_path_buf()));
    }
    Ok(text)
}
