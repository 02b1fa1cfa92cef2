//! Database connection pool, migrations, and error classification.
//!
//! Besides pool/migration plumbing, this module is the one place that knows
//! how PostgreSQL reports failures: [`classify`] maps a raw `sqlx::Error`
//! into the small set of outcomes the transaction service and retry loop
//! act on. Keeping that knowledge here keeps the rest of the code
//! storage-agnostic.

use sqlx::{Pool, Postgres};

/// Type alias for the PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// SQLSTATE raised when the engine aborts one of two transactions that
/// cannot be serialized (serialization_failure).
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when the engine breaks a deadlock (deadlock_detected).
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// SQLSTATE for any unique-constraint violation (unique_violation).
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// Name of the UNIQUE constraint on `transaction_history.idempotency_key`,
/// as created by the migrations. The classifier matches on this identity;
/// if the schema renames the constraint, update this too.
const IDEMPOTENCY_KEY_CONSTRAINT: &str = "transaction_history_idempotency_key_key";

/// Outcome of classifying a storage-layer failure.
///
/// Business-rule failures (insufficient funds, unknown user) never reach
/// this classifier; the transaction service raises them as distinct
/// `AppError` variants before any storage error exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A serialization anomaly or deadlock abort. Expected under
    /// contention; safe to retry the whole attempt.
    RetryableConflict,

    /// Unique violation on the idempotency-key constraint specifically.
    /// A concurrent or earlier attempt with the same key already
    /// committed; the caller should replay the existing record.
    DuplicateKey,

    /// Anything else. Propagated verbatim, never retried.
    Fatal,
}

/// Classify a `sqlx::Error` into retry/replay/fatal.
///
/// Only errors that originate from the database server carry a SQLSTATE;
/// everything else (pool timeouts, decode errors, I/O) is `Fatal`.
///
/// Unique violations are attributed to the idempotency key by the violated
/// constraint's name, falling back to a message substring when the driver
/// does not report the constraint.
pub fn classify(err: &sqlx::Error) -> ErrorClass {
    let Some(db_err) = err.as_database_error() else {
        return ErrorClass::Fatal;
    };

    match db_err.code().as_deref() {
        Some(SQLSTATE_SERIALIZATION_FAILURE) | Some(SQLSTATE_DEADLOCK_DETECTED) => {
            ErrorClass::RetryableConflict
        }
        Some(SQLSTATE_UNIQUE_VIOLATION) => {
            let on_idempotency_key = match db_err.constraint() {
                Some(constraint) => constraint == IDEMPOTENCY_KEY_CONSTRAINT,
                None => db_err.message().contains("idempotency_key"),
            };
            if on_idempotency_key {
                ErrorClass::DuplicateKey
            } else {
                ErrorClass::Fatal
            }
        }
        _ => ErrorClass::Fatal,
    }
}

/// Create a new PostgreSQL connection pool.
///
/// Connections are created lazily and reused across requests.
///
/// # Errors
///
/// Returns an error if the connection string is invalid or the server
/// cannot be reached.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Applied migrations are tracked in `_sqlx_migrations`, so each file runs
/// only once. The macro embeds the files at compile time.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
