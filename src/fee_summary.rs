//! Computes how much a student owes for an academic year.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, Money,
    academic_year::get_academic_year,
    annual_fee::get_annual_fee,
    database_id::{StudentId, YearId},
    student::{StudentDetails, get_student},
    transaction::{TransactionType, sum_student_transactions},
};

/// The amounts due, paid and pending for a student in one academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeTotals {
    /// The annual fee plus any fees carried forward into the year.
    pub total_fees_due: Money,
    /// The sum of the fee payments made for the year.
    pub total_amount_paid: Money,
    /// What is left to pay. Negative if the student has overpaid.
    pub pending_fees: Money,
}

impl FeeTotals {
    /// Work out the totals from the annual fee, the total carried forward
    /// from earlier years and the total paid.
    ///
    /// # Errors
    /// Returns [Error::AmountOutOfRange] if a total does not fit in [Money].
    pub fn compute(
        annual_fee: Money,
        carried_forward: Money,
        paid: Money,
    ) -> Result<Self, Error> {
        let total_fees_due = annual_fee
            .checked_add(carried_forward)
            .ok_or(Error::AmountOutOfRange)?;
        let pending_fees = total_fees_due
            .checked_sub(paid)
            .ok_or(Error::AmountOutOfRange)?;

        Ok(Self {
            total_fees_due,
            total_amount_paid: paid,
            pending_fees,
        })
    }
}

/// A student's fee position for an academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSummary {
    /// The student the summary is for.
    pub student_details: StudentDetails,
    /// The name of the academic year, e.g. "2024-2025".
    pub academic_year: String,
    /// The annual fee plus any fees carried forward into the year.
    pub total_fees_due: Money,
    /// The sum of the fee payments made for the year.
    pub total_amount_paid: Money,
    /// `total_fees_due - total_amount_paid`.
    pub pending_fees: Money,
}

/// Build the fee summary for `student_id` in `year_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::StudentNotFound] if the student does not exist,
/// - [Error::AcademicYearNotFound] if the academic year does not exist,
/// - [Error::FeeRecordNotFound] if no annual fee is set for the student in that year,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_fee_summary(
    student_id: StudentId,
    year_id: YearId,
    connection: &Connection,
) -> Result<FeeSummary, Error> {
    let student = get_student(student_id, connection)?;
    let academic_year = get_academic_year(year_id, connection)?;
    let annual_fee = get_annual_fee(student_id, year_id, connection)?;

    let carried_forward = sum_student_transactions(
        student_id,
        year_id,
        TransactionType::FeeCarryForward,
        connection,
    )?;
    let paid =
        sum_student_transactions(student_id, year_id, TransactionType::FeePayment, connection)?;

    let totals = FeeTotals::compute(annual_fee.total_annual_fees, carried_forward, paid)?;

    Ok(FeeSummary {
        student_details: StudentDetails::from(&student),
        academic_year: academic_year.name,
        total_fees_due: totals.total_fees_due,
        total_amount_paid: totals.total_amount_paid,
        pending_fees: totals.pending_fees,
    })
}

/// A route handler for getting a student's fee summary for an academic year.
///
/// # Errors
/// Returns an error if the path is malformed or [get_fee_summary] fails.
pub async fn get_fee_summary_endpoint(
    State(state): State<AppState>,
    path: Result<Path<(StudentId, YearId)>, PathRejection>,
) -> Result<Json<FeeSummary>, Error> {
    let Path((student_id, year_id)) = path?;

    let connection = state.connection()?;
    let summary = get_fee_summary(student_id, year_id, &connection)?;

    Ok(Json(summary))
}
