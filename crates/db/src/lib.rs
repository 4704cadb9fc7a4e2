//! Order record store.
//!
//! One reader/writer lock guards the whole collection. Callers always receive
//! owned copies of records, so nothing handed out aliases store state and no
//! lock outlives a single store call.

pub mod fixtures;
pub mod snapshot;
pub mod store;

pub use fixtures::seed_orders;
pub use store::{OrderStore, StoreError};
