//! Transaction data models and API request/response types.
//!
//! This module defines:
//! - `TransactionAction`: the closed set of supported ledger actions
//! - `TransactionRecord`: database entity for one applied transaction
//! - `CreateTransactionRequest`: request body with amount validation
//! - `TransactionResponse`: response body returned to clients

use crate::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// The closed set of ledger actions.
///
/// Only `Debit` is legal today; the enum exists so future actions can be
/// added without changing the history table or this carrier type's shape.
/// The wire and database form is the uppercase name (`"DEBIT"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionAction {
    Debit,
}

impl TransactionAction {
    /// Database/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionAction::Debit => "DEBIT",
        }
    }
}

/// Raised when a history row carries an action this build does not know.
#[derive(Debug, thiserror::Error)]
#[error("unknown transaction action: {0}")]
pub struct UnknownAction(String);

/// Decode from the TEXT column. Used by the `FromRow` derive below.
impl TryFrom<String> for TransactionAction {
    type Error = UnknownAction;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "DEBIT" => Ok(TransactionAction::Debit),
            _ => Err(UnknownAction(value)),
        }
    }
}

/// Represents one row of the append-only transaction history.
///
/// # Database Table
///
/// Maps to `transaction_history`. Each record:
/// - is immutable once created
/// - is globally unique per idempotency key (UNIQUE constraint)
/// - carries the commit-time timestamp assigned by the database
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TransactionRecord {
    /// Generated unique identifier (UUID v4, no coordination needed)
    pub id: Uuid,

    /// The account this record belongs to
    pub user_id: i64,

    /// What was done; stored as TEXT, decoded into the closed enum
    #[sqlx(try_from = "String")]
    pub action: TransactionAction,

    /// Amount applied, strictly positive, 2 fractional digits
    pub amount: Decimal,

    /// Caller-supplied opaque token, globally unique across all records
    pub idempotency_key: String,

    /// When the record was committed
    pub ts: DateTime<Utc>,
}

/// Request body for creating a transaction.
///
/// # JSON Example
///
/// ```json
/// {
///   "action": "DEBIT",
///   "amount": "150.00"
/// }
/// ```
///
/// The amount travels as a string so clients never round it through a
/// float. The idempotency key comes from the `Idempotency-Key` header,
/// not the body.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Requested action; deserialization rejects unknown values
    pub action: TransactionAction,

    /// Decimal string, > 0, at most 2 fractional digits
    pub amount: String,
}

impl CreateTransactionRequest {
    /// Parse and validate the amount field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the string is not a plain decimal,
    /// is zero or negative, or carries more than 2 fractional digits.
    pub fn validated_amount(&self) -> Result<Decimal, AppError> {
        let amount = Decimal::from_str(&self.amount).map_err(|_| {
            AppError::InvalidRequest(format!("amount is not a valid decimal: {}", self.amount))
        })?;

        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidRequest(
                "amount must be positive".to_string(),
            ));
        }

        if amount.scale() > 2 {
            return Err(AppError::InvalidRequest(
                "amount must have at most 2 fractional digits".to_string(),
            ));
        }

        Ok(amount)
    }
}

/// Response returned for transaction operations.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": "770e8400-e29b-41d4-a716-446655440002",
///   "userId": 42,
///   "action": "DEBIT",
///   "amount": "150.00",
///   "idempotencyKey": "debit-2025-001",
///   "ts": "2025-12-21T16:00:00Z"
/// }
/// ```
///
/// A replayed duplicate returns the original record byte-for-byte: same
/// id, same timestamp, never a fresh one.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Uuid,
    pub user_id: i64,
    pub action: TransactionAction,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub idempotency_key: String,
    pub ts: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            action: record.action,
            amount: record.amount,
            idempotency_key: record.idempotency_key,
            ts: record.ts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(amount: &str) -> CreateTransactionRequest {
        CreateTransactionRequest {
            action: TransactionAction::Debit,
            amount: amount.to_string(),
        }
    }

    #[test]
    fn accepts_valid_amounts() {
        assert_eq!(
            request("150.00").validated_amount().unwrap(),
            Decimal::from_str("150.00").unwrap()
        );
        assert_eq!(
            request("0.01").validated_amount().unwrap(),
            Decimal::from_str("0.01").unwrap()
        );
        // integral is fine, scale 0
        assert!(request("1000").validated_amount().is_ok());
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert!(matches!(
            request("0").validated_amount(),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            request("-5.00").validated_amount(),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_more_than_two_fractional_digits() {
        assert!(matches!(
            request("1.001").validated_amount(),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(request("ten dollars").validated_amount().is_err());
        assert!(request("").validated_amount().is_err());
    }

    #[test]
    fn action_wire_format_is_uppercase() {
        let json = serde_json::to_string(&TransactionAction::Debit).unwrap();
        assert_eq!(json, "\"DEBIT\"");

        let parsed: TransactionAction = serde_json::from_str("\"DEBIT\"").unwrap();
        assert_eq!(parsed, TransactionAction::Debit);

        // unknown actions are rejected at deserialization
        assert!(serde_json::from_str::<TransactionAction>("\"CREDIT\"").is_err());
    }

    #[test]
    fn action_round_trips_through_text_column_form() {
        let stored = TransactionAction::Debit.as_str().to_string();
        assert_eq!(
            TransactionAction::try_from(stored).unwrap(),
            TransactionAction::Debit
        );
        assert!(TransactionAction::try_from("REFUND".to_string()).is_err());
    }

    #[test]
    fn response_uses_camel_case_and_string_amount() {
        let record = TransactionRecord {
            id: Uuid::nil(),
            user_id: 42,
            action: TransactionAction::Debit,
            amount: Decimal::from_str("150.00").unwrap(),
            idempotency_key: "debit-2025-001".to_string(),
            ts: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_value(TransactionResponse::from(record)).unwrap();
        assert_eq!(json["userId"], 42);
        assert_eq!(json["amount"], "150.00");
        assert_eq!(json["idempotencyKey"], "debit-2025-001");
        assert_eq!(json["action"], "DEBIT");
    }
}
