//! Defines the endpoint for recording a student's fee payment.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error, Money,
    academic_year::get_academic_year,
    database_id::{StudentId, TransactionId, YearId},
    student::get_student,
    transaction::{PaymentMethod, Transaction, TransactionType, create_transaction},
    user::User,
};

/// The JSON body for recording a fee payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeePaymentRequest {
    /// The student who paid.
    pub student_id: StudentId,
    /// How much was paid. Must be greater than zero.
    pub amount: Money,
    /// The date the payment was made.
    pub transaction_date: Date,
    /// How the payment was made.
    pub payment_method: PaymentMethod,
    /// The academic year the payment counts towards.
    pub year_id: YearId,
    /// E.g. a receipt or cheque number.
    #[serde(default)]
    pub reference_details: Option<String>,
    /// Free text notes about the payment.
    #[serde(default)]
    pub description: Option<String>,
}

/// The message returned after a fee payment is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeePaymentResponse {
    /// A human readable confirmation.
    pub message: String,
    /// The ID of the new transaction.
    pub transaction_id: TransactionId,
}

/// A route handler for recording a fee payment as the current user.
///
/// Every call creates a new transaction, so submitting the same payment twice
/// records it twice.
///
/// # Errors
///
/// This function will return an error if:
/// - the body is not a valid payment,
/// - the amount is zero or negative,
/// - the student does not exist,
/// - or the academic year does not exist.
pub async fn record_fee_payment(
    State(state): State<AppState>,
    Extension(current_user): Extension<User>,
    payload: Result<Json<FeePaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FeePaymentResponse>), Error> {
    let Json(payment) = payload?;

    if !payment.amount.is_positive() {
        return Err(Error::NonPositiveAmount);
    }

    let connection = state.connection()?;
    get_student(payment.student_id, &connection)?;
    get_academic_year(payment.year_id, &connection)?;

    let transaction = create_transaction(
        Transaction::build(
            TransactionType::FeePayment,
            payment.amount,
            payment.transaction_date,
            current_user.id,
        )
        .student_id(Some(payment.student_id))
        .year_id(Some(payment.year_id))
        .payment_method(Some(payment.payment_method))
        .reference_details(payment.reference_details)
        .description(payment.description),
        &connection,
    )?;

    tracing::info!(
        "User {} recorded fee payment {} of {} for student {}",
        current_user.id,
        transaction.id,
        transaction.amount,
        payment.student_id
    );

    Ok((
        StatusCode::CREATED,
        Json(FeePaymentResponse {
            message: "Fee payment recorded successfully".to_owned(),
            transaction_id: transaction.id,
        }),
    ))
}

#[cfg(test)]
mod fee_payment_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        AppState, Money, Role, build_router, endpoints,
        test_utils::{get_test_state, insert_test_student, insert_test_user, insert_test_year, log_in},
        transaction::{
            PaymentMethod, TransactionType, count_transactions, get_transaction,
        },
    };

    use super::FeePaymentResponse;

    struct Fixture {
        state: AppState,
        server: TestServer,
        token: String,
        student_id: i64,
        year_id: i64,
    }

    async fn setup() -> Fixture {
        let state = get_test_state();
        insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        let student = insert_test_student(&state, "ADM-042", "Alan", "Turing");
        let year = insert_test_year(&state, 2024);
        let server = TestServer::new(build_router(state.clone()));
        let token = log_in(&server, "bursar", "hunter2").await;

        Fixture {
            state,
            server,
            token,
            student_id: student.id,
            year_id: year.id,
        }
    }

    #[tokio::test]
    async fn records_payment() {
        let fixture = setup().await;

        let response = fixture
            .server
            .post(endpoints::FEE_PAYMENT)
            .authorization_bearer(&fixture.token)
            .json(&json!({
                "student_id": fixture.student_id,
                "amount": 500.00,
                "transaction_date": "2024-03-01",
                "payment_method": "Cash",
                "year_id": fixture.year_id,
                "reference_details": "RCPT-001",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: FeePaymentResponse = response.json();
        assert_eq!(body.message, "Fee payment recorded successfully");

        let connection = fixture.state.connection().unwrap();
        let transaction = get_transaction(body.transaction_id, &connection).unwrap();
        assert_eq!(transaction.transaction_type, TransactionType::FeePayment);
        assert_eq!(transaction.amount, Money::from_cents(50_000));
        assert_eq!(transaction.student_id, Some(fixture.student_id));
        assert_eq!(transaction.year_id, Some(fixture.year_id));
        assert_eq!(transaction.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(transaction.reference_details.as_deref(), Some("RCPT-001"));
        assert_eq!(transaction.description, None);
    }

    #[tokio::test]
    async fn duplicate_submissions_create_distinct_transactions() {
        let fixture = setup().await;
        let payment = json!({
            "student_id": fixture.student_id,
            "amount": 125.50,
            "transaction_date": "2024-03-01",
            "payment_method": "Bank Transfer",
            "year_id": fixture.year_id,
        });

        let first: FeePaymentResponse = fixture
            .server
            .post(endpoints::FEE_PAYMENT)
            .authorization_bearer(&fixture.token)
            .json(&payment)
            .await
            .json();
        let second: FeePaymentResponse = fixture
            .server
            .post(endpoints::FEE_PAYMENT)
            .authorization_bearer(&fixture.token)
            .json(&payment)
            .await
            .json();

        assert_ne!(first.transaction_id, second.transaction_id);
        assert_eq!(
            count_transactions(&fixture.state.connection().unwrap()),
            Ok(2)
        );
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let fixture = setup().await;

        for amount in [0.0, -10.0] {
            let response = fixture
                .server
                .post(endpoints::FEE_PAYMENT)
                .authorization_bearer(&fixture.token)
                .json(&json!({
                    "student_id": fixture.student_id,
                    "amount": amount,
                    "transaction_date": "2024-03-01",
                    "payment_method": "Cash",
                    "year_id": fixture.year_id,
                }))
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
        }
        assert_eq!(
            count_transactions(&fixture.state.connection().unwrap()),
            Ok(0)
        );
    }

    #[tokio::test]
    async fn rejects_unknown_student() {
        let fixture = setup().await;

        let response = fixture
            .server
            .post(endpoints::FEE_PAYMENT)
            .authorization_bearer(&fixture.token)
            .json(&json!({
                "student_id": 999,
                "amount": 10,
                "transaction_date": "2024-03-01",
                "payment_method": "Cash",
                "year_id": fixture.year_id,
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["detail"], "Student not found");
    }

    #[tokio::test]
    async fn rejects_unknown_year() {
        let fixture = setup().await;

        let response = fixture
            .server
            .post(endpoints::FEE_PAYMENT)
            .authorization_bearer(&fixture.token)
            .json(&json!({
                "student_id": fixture.student_id,
                "amount": 10,
                "transaction_date": "2024-03-01",
                "payment_method": "Cash",
                "year_id": 1999,
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["detail"], "Academic year not found");
    }

    #[tokio::test]
    async fn rejects_unknown_payment_method() {
        let fixture = setup().await;

        let response = fixture
            .server
            .post(endpoints::FEE_PAYMENT)
            .authorization_bearer(&fixture.token)
            .json(&json!({
                "student_id": fixture.student_id,
                "amount": 10,
                "transaction_date": "2024-03-01",
                "payment_method": "IOU",
                "year_id": fixture.year_id,
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn requires_token() {
        let fixture = setup().await;

        fixture
            .server
            .post(endpoints::FEE_PAYMENT)
            .json(&json!({
                "student_id": fixture.student_id,
                "amount": 10,
                "transaction_date": "2024-03-01",
                "payment_method": "Cash",
                "year_id": fixture.year_id,
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
