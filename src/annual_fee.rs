//! The fee schedule: how much each student owes for an academic year.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Money,
    database_id::{DatabaseId, StudentId, YearId},
};

/// The total fees a student must pay for one academic year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualFee {
    /// The ID of the fee record.
    pub id: DatabaseId,
    /// The student who owes the fees.
    pub student_id: StudentId,
    /// The year the fees are for.
    pub year_id: YearId,
    /// The fees due for the whole year, before any carry forward.
    pub total_annual_fees: Money,
    /// Free text, e.g. the reason for a discount.
    pub notes: Option<String>,
}

/// Create the annual fee table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_annual_fee_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS student_annual_fee (
                id INTEGER PRIMARY KEY,
                student_id INTEGER NOT NULL,
                year_id INTEGER NOT NULL,
                total_annual_fees INTEGER NOT NULL CHECK (total_annual_fees >= 0),
                notes TEXT,
                UNIQUE(student_id, year_id),
                FOREIGN KEY(student_id) REFERENCES student(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(year_id) REFERENCES academic_year(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Set the fees `student_id` owes for `year_id`, replacing any existing amount.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidInput] if `total_annual_fees` is negative,
/// - [Error::AmountOutOfRange] if `total_annual_fees` is larger than [Money::MAX],
/// - [Error::InvalidForeignKey] if the student or year does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_annual_fee(
    student_id: StudentId,
    year_id: YearId,
    total_annual_fees: Money,
    notes: Option<&str>,
    connection: &Connection,
) -> Result<AnnualFee, Error> {
    if total_annual_fees < Money::ZERO {
        return Err(Error::InvalidInput(
            "Annual fees cannot be negative.".to_owned(),
        ));
    }

    if !total_annual_fees.is_in_range() {
        return Err(Error::AmountOutOfRange);
    }

    let annual_fee = connection
        .prepare(
            "INSERT INTO student_annual_fee (student_id, year_id, total_annual_fees, notes)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(student_id, year_id)
             DO UPDATE SET total_annual_fees = excluded.total_annual_fees, notes = excluded.notes
             RETURNING id, student_id, year_id, total_annual_fees, notes",
        )?
        .query_row(
            (student_id, year_id, total_annual_fees, notes),
            map_annual_fee_row,
        )?;

    Ok(annual_fee)
}

fn map_annual_fee_row(row: &Row) -> Result<AnnualFee, rusqlite::Error> {
    Ok(AnnualFee {
        id: row.get(0)?,
        student_id: row.get(1)?,
        year_id: row.get(2)?,
        total_annual_fees: row.get(3)?,
        notes: row.get(4)?,
    })
}

/// Get the fees `student_id` owes for `year_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::FeeRecordNotFound] if no fees have been set for the pair,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_annual_fee(
    student_id: StudentId,
    year_id: YearId,
    connection: &Connection,
) -> Result<AnnualFee, Error> {
    connection
        .prepare(
            "SELECT id, student_id, year_id, total_annual_fees, notes FROM student_annual_fee
             WHERE student_id = :student_id AND year_id = :year_id",
        )?
        .query_row(
            &[(":student_id", &student_id), (":year_id", &year_id)],
            map_annual_fee_row,
        )
        .map_err(|error| match error.into() {
            Error::NotFound => Error::FeeRecordNotFound,
            error => error,
        })
}
