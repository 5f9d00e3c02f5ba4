//! Academic years that fees and payments are recorded against.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::YearId};

/// A school year, e.g. "2024-2025".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicYear {
    /// The ID of the academic year.
    pub id: YearId,
    /// The label of the year. Unique.
    pub name: String,
    /// The first day of the year.
    pub start_date: Date,
    /// The last day of the year.
    pub end_date: Date,
    /// Whether this is the year currently in progress.
    pub is_current: bool,
}

/// The data needed to create an [AcademicYear].
#[derive(Debug, Clone)]
pub struct NewAcademicYear {
    /// Sets the ID explicitly, e.g. to use the calendar year as the ID.
    /// If `None`, the database assigns the next free ID.
    pub id: Option<YearId>,
    /// The label of the year. Must be unique.
    pub name: String,
    /// The first day of the year.
    pub start_date: Date,
    /// The last day of the year.
    pub end_date: Date,
    /// Whether this is the year currently in progress.
    pub is_current: bool,
}

/// Create the academic year table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_academic_year_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS academic_year (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                is_current INTEGER NOT NULL DEFAULT 0,
                CHECK (start_date <= end_date)
                )",
        (),
    )?;

    Ok(())
}

/// Create a new academic year in the database.
///
/// # Errors
/// Returns an:
/// - [Error::InvalidDateRange] if the year starts after it ends,
/// - or [Error::SqlError] if the name or ID is taken or there is some other SQL error.
pub fn create_academic_year(
    new_year: NewAcademicYear,
    connection: &Connection,
) -> Result<AcademicYear, Error> {
    if new_year.start_date > new_year.end_date {
        return Err(Error::InvalidDateRange);
    }

    connection.execute(
        "INSERT INTO academic_year (id, name, start_date, end_date, is_current)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_year.id,
            &new_year.name,
            new_year.start_date,
            new_year.end_date,
            new_year.is_current,
        ),
    )?;

    Ok(AcademicYear {
        id: connection.last_insert_rowid(),
        name: new_year.name,
        start_date: new_year.start_date,
        end_date: new_year.end_date,
        is_current: new_year.is_current,
    })
}

fn map_academic_year_row(row: &Row) -> Result<AcademicYear, rusqlite::Error> {
    Ok(AcademicYear {
        id: row.get(0)?,
        name: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
        is_current: row.get(4)?,
    })
}

/// Retrieve an academic year from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::AcademicYearNotFound] if `id` does not refer to an academic year,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_academic_year(id: YearId, connection: &Connection) -> Result<AcademicYear, Error> {
    connection
        .prepare(
            "SELECT id, name, start_date, end_date, is_current FROM academic_year WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_academic_year_row)
        .map_err(|error| match error.into() {
            Error::NotFound => Error::AcademicYearNotFound,
            error => error,
        })
}
