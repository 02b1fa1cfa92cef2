//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, headers)
//! 2. Runs validation and calls into the services layer
//! 3. Returns an HTTP response (JSON, status code)

pub mod health;
pub mod transactions;
pub mod users;
