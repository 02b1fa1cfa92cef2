//! Business logic services.
//!
//! Services contain the core debit logic separated from HTTP handlers:
//! the serializable transaction scope, idempotent replay, and the
//! conflict-retry loop that wraps it.

pub mod retry;
pub mod transaction_service;
