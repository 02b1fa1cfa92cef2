//! Ledger account data model and balance response type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Represents a user (ledger account) row from the database.
///
/// # Balance Storage
///
/// Balances are stored as NUMERIC(20, 2) and mapped to `rust_decimal::Decimal`
/// so arithmetic is exact. Floats never touch money anywhere in this service.
///
/// The guarded UPDATE in the transaction service is what keeps a balance
/// from going below zero; nothing here reads and compares.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct User {
    /// Stable externally-provided identifier
    pub id: i64,

    /// Current balance, exactly 2 fractional digits, never negative
    pub balance: Decimal,

    /// Timestamp when the account was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last balance update
    pub updated_at: DateTime<Utc>,
}

/// Response body for the balance endpoint.
///
/// # JSON Example
///
/// ```json
/// { "balance": "849.50" }
/// ```
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current balance as a decimal string
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
}

impl From<User> for BalanceResponse {
    fn from(user: User) -> Self {
        Self {
            balance: user.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn balance_serializes_as_decimal_string() {
        let response = BalanceResponse {
            balance: Decimal::from_str("849.50").unwrap(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({ "balance": "849.50" }));
    }
}
