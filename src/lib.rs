//! School Finance is a web service for recording student fee payments and
//! reporting on a school's finances.
//!
//! This library provides a REST API that serves JSON, plus a [client] for
//! talking to that API with an explicit login session.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod academic_year;
mod annual_fee;
mod app_state;
mod auth;
pub mod client;
mod database_id;
mod db;
pub mod endpoints;
mod fee_summary;
mod logging;
mod money;
mod routing;
mod sql_enum;
mod student;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use academic_year::{AcademicYear, NewAcademicYear, create_academic_year, get_academic_year};
pub use annual_fee::{AnnualFee, get_annual_fee, set_annual_fee};
pub use app_state::AppState;
pub use auth::{LogInData, PasswordHash, SignUpRequest, TokenKeys, TokenResponse, UserResponse};
pub use database_id::{DatabaseId, StudentId, TransactionId, YearId};
pub use db::initialize as initialize_db;
pub use fee_summary::{FeeSummary, FeeTotals, get_fee_summary};
pub use logging::{LOG_BODY_LENGTH_LIMIT, REQUEST_BODY_LIMIT, logging_middleware};
pub use money::Money;
pub use routing::build_router;
pub use student::{NewStudent, Student, StudentDetails, StudentStatus, create_student, get_student};
pub use transaction::{
    DateRange, FeePaymentRequest, FeePaymentResponse, HistoryQuery, PaymentMethod, Transaction,
    TransactionBuilder, TransactionRecord, TransactionType, create_transaction,
    get_transaction_history,
};
pub use user::{NewUser, Role, User, UserID, count_users, create_user, get_user_by_username};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username does not exist or the password does not match.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// The bearer token is missing, malformed, expired, or refers to a user
    /// that no longer exists or has been deactivated.
    #[error("could not validate credentials")]
    InvalidToken,

    /// The authenticated user is not allowed to perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A user with the same username already exists.
    #[error("username already registered")]
    DuplicateUsername,

    /// The request body, path or query could not be parsed, or a field
    /// failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A payment amount of zero or less was submitted.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    /// The start date of a date range is after its end date.
    #[error("start date cannot be after end date")]
    InvalidDateRange,

    /// No student has the requested ID.
    #[error("student not found")]
    StudentNotFound,

    /// No academic year has the requested ID.
    #[error("academic year not found")]
    AcademicYearNotFound,

    /// The student has no fee schedule for the academic year.
    #[error("no fee record found for the student and academic year")]
    FeeRecordNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    /// Callers should usually replace it with a more specific error.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A record referred to a student, academic year or user that does not
    /// exist.
    #[error("a referenced record does not exist")]
    InvalidForeignKey,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The access token could not be created.
    #[error("could not create access token: {0}")]
    TokenCreation(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The request body was larger than the server accepts or could not be read.
    #[error("request body is too large")]
    PayloadTooLarge,

    /// A handler produced a response body that could not be read back.
    #[error("could not read response body: {0}")]
    ResponseBody(String),

    /// A calculation on amounts of money went out of range.
    #[error("amount out of range")]
    AmountOutOfRange,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidInput(rejection.body_text())
    }
}

impl From<FormRejection> for Error {
    fn from(rejection: FormRejection) -> Self {
        Error::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidInput(rejection.body_text())
    }
}

impl Error {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Incorrect username or password".to_owned(),
            ),
            Error::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Could not validate credentials".to_owned(),
            ),
            Error::Forbidden(reason) => (StatusCode::FORBIDDEN, reason.clone()),
            Error::DuplicateUsername => (
                StatusCode::BAD_REQUEST,
                "Username already registered".to_owned(),
            ),
            Error::InvalidInput(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            Error::NonPositiveAmount => (
                StatusCode::BAD_REQUEST,
                "Amount must be greater than zero.".to_owned(),
            ),
            Error::InvalidDateRange => (
                StatusCode::BAD_REQUEST,
                "Start date cannot be after end date.".to_owned(),
            ),
            Error::StudentNotFound => (StatusCode::NOT_FOUND, "Student not found".to_owned()),
            Error::AcademicYearNotFound => (
                StatusCode::NOT_FOUND,
                "Academic year not found".to_owned(),
            ),
            Error::FeeRecordNotFound => (
                StatusCode::NOT_FOUND,
                "No fee record found for student for the specified academic year.".to_owned(),
            ),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not found".to_owned()),
            Error::AmountOutOfRange => (
                StatusCode::BAD_REQUEST,
                "Amount is out of range.".to_owned(),
            ),
            Error::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body is too large.".to_owned(),
            ),
            Error::InvalidForeignKey => (
                StatusCode::BAD_REQUEST,
                "The request refers to a student, academic year or user that does not exist."
                    .to_owned(),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        let mut response = (status, Json(json!({ "detail": detail }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
