pub mod config;
pub mod domain;
pub mod errors;
pub mod sop;

pub use domain::order::{OrderId, OrderRecord};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use sop::{SopError, SopKind, SopRegistry};
