//! Transaction HTTP handler.
//!
//! Implements `POST /users/{user_id}/transactions`: validates the request
//! shape, then hands the debit intent to the retry-wrapped transaction
//! service. Validation lives here so the service only ever sees
//! well-formed amounts and actions; the service still defends against an
//! unknown user on its own.

use crate::{
    db::DbPool,
    error::AppError,
    models::transaction::{CreateTransactionRequest, TransactionResponse},
    services::{retry, transaction_service},
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};

/// Header carrying the caller-supplied idempotency token.
const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Debit a user's balance.
///
/// # Endpoint
///
/// `POST /users/{user_id}/transactions`
///
/// # Request
///
/// `Idempotency-Key` header (required, non-empty) plus body:
///
/// ```json
/// {
///   "action": "DEBIT",
///   "amount": "150.00"
/// }
/// ```
///
/// # Response (201 Created)
///
/// The created record, or the original record when the idempotency key
/// was seen before (a replay, with identical id and timestamp, no new row):
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
/// # Errors
///
/// - **400**: missing/empty idempotency header, malformed amount or action
/// - **404**: user does not exist
/// - **409**: insufficient funds
pub async fn create_transaction(
    State(pool): State<DbPool>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    body: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    // Axum's Json extractor rejects malformed bodies with 422 on its own;
    // taking the Result lets a missing field or unknown action flow
    // through the 400 path like every other validation failure.
    let Json(request) = body.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            AppError::InvalidRequest(format!("missing {IDEMPOTENCY_KEY_HEADER} header"))
        })?
        .to_string();

    let amount = request.validated_amount()?;

    // Serialization conflicts under contention are absorbed here; the
    // caller only ever sees the final outcome.
    let record = retry::with_retry(|| {
        transaction_service::create_transaction(
            &pool,
            user_id,
            request.action,
            amount,
            &idempotency_key,
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

#[cfg(test)]
mod tests {
    //! Request-shape validation through the real router. The pool is
    //! created lazily and never connected; every case here is rejected
    //! before any query runs.

    use super::*;
    use axum::{Router, body::Body, http::Request, routing::post};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/unused")
            .unwrap();
        Router::new()
            .route("/users/{id}/transactions", post(create_transaction))
            .with_state(pool)
    }

    async fn post_json(body: &str, idempotency_key: Option<&str>) -> StatusCode {
        let mut request = Request::builder()
            .method("POST")
            .uri("/users/1/transactions")
            .header("content-type", "application/json");
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        response.status()
    }

    #[tokio::test]
    async fn unknown_action_returns_400() {
        let status = post_json(r#"{"action":"CREDIT","amount":"5.00"}"#, Some("key-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_amount_field_returns_400() {
        let status = post_json(r#"{"action":"DEBIT"}"#, Some("key-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_json_body_returns_400() {
        let status = post_json("not json", Some("key-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_idempotency_header_returns_400() {
        let status = post_json(r#"{"action":"DEBIT","amount":"5.00"}"#, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_idempotency_header_returns_400() {
        let status = post_json(r#"{"action":"DEBIT","amount":"5.00"}"#, Some("   ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn overscaled_amount_returns_400() {
        let status = post_json(r#"{"action":"DEBIT","amount":"5.001"}"#, Some("key-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
