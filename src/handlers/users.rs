//! User balance HTTP handler.
//!
//! A plain point lookup at default read consistency: balance reads do not
//! participate in the debit transaction and need no special isolation.

use crate::{
    db::DbPool,
    error::AppError,
    models::user::{BalanceResponse, User},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// Get the current balance of a user.
///
/// # Endpoint
///
/// `GET /users/{id}/balance`
///
/// # Response
///
/// - **Success (200 OK)**: `{ "balance": "849.50" }`
/// - **Error (404)**: user does not exist
pub async fn get_balance(
    State(pool): State<DbPool>,
    Path(user_id): Path<i64>,
) -> Result<Json<BalanceResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, balance, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::UserNotFound)?;

    Ok(Json(user.into()))
}
