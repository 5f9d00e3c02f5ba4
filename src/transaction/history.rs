//! Lists the transactions recorded within a date range.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error, Money,
    database_id::{StudentId, TransactionId},
    transaction::TransactionType,
};

/// An inclusive range of dates where the start is no later than the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Create a range from `start` to `end`, including both.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidDateRange);
        }

        Ok(Self { start, end })
    }

    /// The first day in the range.
    pub fn start(&self) -> Date {
        self.start
    }

    /// The last day in the range.
    pub fn end(&self) -> Date {
        self.end
    }
}

/// The query string for the transaction history endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryQuery {
    /// The first day to include.
    pub start_date: Date,
    /// The last day to include.
    pub end_date: Date,
}

/// A transaction as shown in the history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The ID of the transaction.
    pub transaction_id: TransactionId,
    /// What kind of money movement this is.
    pub transaction_type: TransactionType,
    /// How much money moved.
    pub amount: Money,
    /// When the money moved.
    pub transaction_date: Date,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// A free text category.
    pub category: Option<String>,
    /// The student the transaction is for, if any.
    pub student_id: Option<StudentId>,
    /// The full name of the staff member who recorded the transaction.
    pub recorded_by: String,
}

fn map_record_row(row: &Row) -> Result<TransactionRecord, rusqlite::Error> {
    Ok(TransactionRecord {
        transaction_id: row.get(0)?,
        transaction_type: row.get(1)?,
        amount: row.get(2)?,
        transaction_date: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        student_id: row.get(6)?,
        recorded_by: row.get(7)?,
    })
}

/// Get the transactions dated within `range`, newest first.
///
/// Transactions on the same day are ordered by ID, highest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transaction_history(
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<TransactionRecord>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.transaction_type, t.amount, t.date, t.description, t.category,
                t.student_id, u.full_name
             FROM \"transaction\" t
             INNER JOIN user u ON u.id = t.recorded_by
             WHERE t.date BETWEEN :start AND :end
             ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(
            &[(":start", &range.start()), (":end", &range.end())],
            map_record_row,
        )?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// A route handler for listing the transactions within a date range.
///
/// # Errors
/// Returns an [Error::InvalidDateRange] if the start date is after the end
/// date, or [Error::InvalidInput] if either date is missing or malformed.
pub async fn get_transaction_history_endpoint(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<TransactionRecord>>, Error> {
    let Query(query) = query?;
    let range = DateRange::new(query.start_date, query.end_date)?;

    let connection = state.connection()?;
    let records = get_transaction_history(range, &connection)?;

    Ok(Json(records))
}

#[cfg(test)]
mod history_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        Error, Money, Role, build_router,
        db::initialize,
        endpoints,
        test_utils::{get_test_state, insert_test_user, log_in, seed_student, seed_user},
        transaction::{Transaction, TransactionType, create_transaction},
        user::User,
    };

    use super::{DateRange, TransactionRecord, get_transaction_history};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_income(conn: &Connection, user: &User, date: Date, cents: i64) -> i64 {
        create_transaction(
            Transaction::build(
                TransactionType::Income,
                Money::from_cents(cents),
                date,
                user.id,
            ),
            conn,
        )
        .unwrap()
        .id
    }

    #[test]
    fn date_range_rejects_start_after_end() {
        assert_eq!(
            DateRange::new(date!(2024 - 02 - 02), date!(2024 - 02 - 01)),
            Err(Error::InvalidDateRange)
        );
    }

    #[test]
    fn date_range_allows_single_day() {
        let day = date!(2024 - 02 - 01);

        let range = DateRange::new(day, day).unwrap();

        assert_eq!(range.start(), day);
        assert_eq!(range.end(), day);
    }

    #[test]
    fn history_is_inclusive_and_newest_first() {
        let conn = get_test_connection();
        let user = seed_user(&conn, "bursar");
        insert_income(&conn, &user, date!(2024 - 01 - 31), 100);
        let first = insert_income(&conn, &user, date!(2024 - 02 - 01), 200);
        let last = insert_income(&conn, &user, date!(2024 - 02 - 29), 300);
        let same_day_later = insert_income(&conn, &user, date!(2024 - 02 - 01), 400);
        insert_income(&conn, &user, date!(2024 - 03 - 01), 500);

        let records = get_transaction_history(
            DateRange::new(date!(2024 - 02 - 01), date!(2024 - 02 - 29)).unwrap(),
            &conn,
        )
        .unwrap();

        let ids: Vec<i64> = records.iter().map(|record| record.transaction_id).collect();
        assert_eq!(ids, [last, same_day_later, first]);
    }

    #[test]
    fn history_for_single_day_only_returns_that_day() {
        let conn = get_test_connection();
        let user = seed_user(&conn, "bursar");
        let day = date!(2024 - 06 - 15);
        insert_income(&conn, &user, date!(2024 - 06 - 14), 100);
        let wanted = insert_income(&conn, &user, day, 200);
        insert_income(&conn, &user, date!(2024 - 06 - 16), 300);

        let records = get_transaction_history(DateRange::new(day, day).unwrap(), &conn).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_id, wanted);
        assert_eq!(records[0].transaction_date, day);
    }

    #[test]
    fn history_includes_recorder_full_name() {
        let conn = get_test_connection();
        let user = seed_user(&conn, "bursar");
        let student = seed_student(&conn, "ADM-7");
        let day = date!(2024 - 06 - 15);
        create_transaction(
            Transaction::build(
                TransactionType::FeePayment,
                Money::from_cents(12_345),
                day,
                user.id,
            )
            .student_id(Some(student.id))
            .category(Some("Tuition".to_owned()))
            .description(Some("Term 2".to_owned())),
            &conn,
        )
        .unwrap();

        let records = get_transaction_history(DateRange::new(day, day).unwrap(), &conn).unwrap();

        assert_eq!(
            records,
            [TransactionRecord {
                transaction_id: records[0].transaction_id,
                transaction_type: TransactionType::FeePayment,
                amount: Money::from_cents(12_345),
                transaction_date: day,
                description: Some("Term 2".to_owned()),
                category: Some("Tuition".to_owned()),
                student_id: Some(student.id),
                recorded_by: user.full_name.clone(),
            }]
        );
    }

    #[tokio::test]
    async fn endpoint_returns_json_records() {
        let state = get_test_state();
        let user = insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        {
            let conn = state.connection().unwrap();
            insert_income(&conn, &user, date!(2024 - 06 - 15), 5_000);
        }
        let server = TestServer::new(build_router(state));
        let token = log_in(&server, "bursar", "hunter2").await;

        let response = server
            .get(endpoints::TRANSACTION_HISTORY)
            .add_query_param("start_date", "2024-06-01")
            .add_query_param("end_date", "2024-06-30")
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body[0]["transaction_type"], "Income");
        assert_eq!(body[0]["amount"], 50.0);
        assert_eq!(body[0]["transaction_date"], "2024-06-15");
        assert_eq!(body[0]["recorded_by"], user.full_name.as_str());
        assert_eq!(body[0]["student_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn endpoint_rejects_inverted_range() {
        let state = get_test_state();
        insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        let server = TestServer::new(build_router(state));
        let token = log_in(&server, "bursar", "hunter2").await;

        let response = server
            .get(endpoints::TRANSACTION_HISTORY)
            .add_query_param("start_date", "2024-07-01")
            .add_query_param("end_date", "2024-06-30")
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["detail"], "Start date cannot be after end date.");
    }

    #[tokio::test]
    async fn endpoint_rejects_missing_dates() {
        let state = get_test_state();
        insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        let server = TestServer::new(build_router(state));
        let token = log_in(&server, "bursar", "hunter2").await;

        let response = server
            .get(endpoints::TRANSACTION_HISTORY)
            .add_query_param("start_date", "2024-07-01")
            .authorization_bearer(token)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["detail"].is_string());
    }
}
