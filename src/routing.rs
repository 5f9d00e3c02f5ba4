//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, FromRef},
    middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::{AuthState, auth_guard, post_log_in, post_sign_up},
    endpoints,
    fee_summary::get_fee_summary_endpoint,
    logging_middleware,
    logging::REQUEST_BODY_LIMIT,
    student::get_student_details_endpoint,
    transaction::{get_transaction_history_endpoint, record_fee_payment},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_root))
        .route(endpoints::LOG_IN, post(post_log_in));

    let protected_routes = Router::new()
        .route(endpoints::SIGN_UP, post(post_sign_up))
        .route(endpoints::FEE_PAYMENT, post(record_fee_payment))
        .route(
            endpoints::TRANSACTION_HISTORY,
            get(get_transaction_history_endpoint),
        )
        .route(
            endpoints::STUDENT_DETAILS,
            get(get_student_details_endpoint),
        )
        .route(endpoints::FEE_SUMMARY, get(get_fee_summary_endpoint))
        .route_layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            auth_guard,
        ));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_not_found)
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the School Finance API" }))
}

async fn get_not_found() -> Error {
    Error::NotFound
}
