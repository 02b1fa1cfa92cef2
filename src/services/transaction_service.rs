//! Transaction service - core debit processing.
//!
//! This service turns one `(user_id, action, amount, idempotency_key)`
//! request into a durable, atomic state change: balance decrement plus one
//! append-only history row, or neither.
//!
//! # Atomicity Guarantees
//!
//! Each attempt runs inside a single PostgreSQL transaction at SERIALIZABLE
//! isolation. The balance decrement is one guarded UPDATE (`... AND balance
//! >= amount`), a single atomic read-modify-write, so there is no
//! check-then-act window and no application-level lock. Serializable
//! isolation additionally guarantees that the balance mutation and the
//! history append are observed together, and that two racing duplicate
//! submissions resolve to exactly one winner.
//!
//! # Idempotent Replay
//!
//! The UNIQUE constraint on `idempotency_key` is the source of truth for
//! duplicates. When an attempt dies on that constraint the committed record
//! is looked up fresh, outside the dead transaction, and returned verbatim:
//! same id, same timestamp, never a new row.

use crate::{
    db::{self, DbPool, ErrorClass},
    error::AppError,
    models::transaction::{TransactionAction, TransactionRecord},
};
use rust_decimal::Decimal;

/// Execute one debit intent, resolving duplicate submissions to the
/// original record.
///
/// This is exactly one storage attempt; the caller wraps it in
/// [`crate::services::retry::with_retry`] to absorb serialization
/// conflicts.
///
/// # Errors
///
/// - `UserNotFound`: target user does not exist; nothing was attempted
/// - `InsufficientFunds`: balance below `amount`; nothing was mutated
/// - `Conflict`: a duplicate key was detected but no prior record could
///   be found; an internal inconsistency, surfaced rather than guessed at
/// - `Database`: any other storage failure, unchanged
pub async fn create_transaction(
    pool: &DbPool,
    user_id: i64,
    action: TransactionAction,
    amount: Decimal,
    idempotency_key: &str,
) -> Result<TransactionRecord, AppError> {
    match attempt_debit(pool, user_id, action, amount, idempotency_key).await {
        Ok(record) => Ok(record),
        Err(AppError::Database(ref err)) if db::classify(err) == ErrorClass::DuplicateKey => {
            replay_existing(pool, idempotency_key).await
        }
        Err(err) => Err(err),
    }
}

/// One transactional debit attempt.
///
/// Dropping the `sqlx` transaction on any early return rolls it back, so
/// a failed attempt leaves the balance untouched and writes no history.
async fn attempt_debit(
    pool: &DbPool,
    user_id: i64,
    action: TransactionAction,
    amount: Decimal,
    idempotency_key: &str,
) -> Result<TransactionRecord, AppError> {
    let mut tx = pool.begin().await?;

    // Strongest isolation level; must be set before the first statement
    // of the transaction touches data.
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    if !user_exists {
        return Err(AppError::UserNotFound);
    }

    // The predicate makes the decrement conditional on sufficient funds
    // in the same atomic statement. Zero rows affected means the balance
    // was too low.
    let updated_count = sqlx::query(
        r#"
        UPDATE users
        SET balance = balance - $1,
            updated_at = NOW()
        WHERE id = $2 AND balance >= $1
        "#,
    )
    .bind(amount)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated_count == 0 {
        tx.rollback().await?;
        return Err(AppError::InsufficientFunds);
    }

    // Record the debit; `ts` is assigned by the database.
    let record = sqlx::query_as::<_, TransactionRecord>(
        r#"
        INSERT INTO transaction_history (user_id, action, amount, idempotency_key)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, action, amount, idempotency_key, ts
        "#,
    )
    .bind(user_id)
    .bind(action.as_str())
    .bind(amount)
    .bind(idempotency_key)
    .fetch_one(&mut *tx)
    .await?;

    // Commit both changes atomically. A unique violation or serialization
    // abort can still surface here; the caller classifies it.
    tx.commit().await?;

    Ok(record)
}

/// Replay path: the idempotency key already has a committed record.
///
/// The lookup runs on the pool, outside the failed transaction. Finding
/// nothing here means a duplicate was reported for a key with no visible
/// record; the true cause is indeterminate, so it surfaces as `Conflict`
/// rather than being misreported as insufficient funds or retried blindly.
async fn replay_existing(
    pool: &DbPool,
    idempotency_key: &str,
) -> Result<TransactionRecord, AppError> {
    match find_by_idempotency_key(pool, idempotency_key).await? {
        Some(record) => {
            tracing::debug!(idempotency_key, "duplicate submission, replaying record");
            Ok(record)
        }
        None => {
            tracing::error!(
                idempotency_key,
                "duplicate key reported but no record found"
            );
            Err(AppError::Conflict)
        }
    }
}

/// Look up the history record for an idempotency key, if any.
pub async fn find_by_idempotency_key(
    pool: &DbPool,
    idempotency_key: &str,
) -> Result<Option<TransactionRecord>, AppError> {
    let record = sqlx::query_as::<_, TransactionRecord>(
        r#"
        SELECT id, user_id, action, amount, idempotency_key, ts
        FROM transaction_history
        WHERE idempotency_key = $1
        "#,
    )
    .bind(idempotency_key)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}
