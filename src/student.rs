//! Students and the student lookup endpoint.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{AppState, Error, database_id::StudentId, sql_enum::impl_text_column};

/// Whether a student is currently enrolled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentStatus {
    /// Currently enrolled.
    #[default]
    Active,
    /// Enrolled but not attending, e.g. on leave.
    Inactive,
    /// Finished school.
    Graduated,
    /// Left before finishing.
    Withdrawn,
}

impl StudentStatus {
    /// The label used for the status in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "Active",
            StudentStatus::Inactive => "Inactive",
            StudentStatus::Graduated => "Graduated",
            StudentStatus::Withdrawn => "Withdrawn",
        }
    }
}

impl FromStr for StudentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(StudentStatus::Active),
            "Inactive" => Ok(StudentStatus::Inactive),
            "Graduated" => Ok(StudentStatus::Graduated),
            "Withdrawn" => Ok(StudentStatus::Withdrawn),
            other => Err(Error::InvalidInput(format!(
                "unknown student status \"{other}\""
            ))),
        }
    }
}

impl_text_column!(StudentStatus);

/// A student enrolled at the school.
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    /// The ID of the student.
    pub id: StudentId,
    /// The number given to the student at admission. Unique.
    pub admission_number: String,
    /// The student's given name.
    pub first_name: String,
    /// The student's family name.
    pub last_name: String,
    /// The date the student was admitted.
    pub admission_date: Date,
    /// Whether the student is currently enrolled.
    pub status: StudentStatus,
}

impl Student {
    /// The student's first and last name separated by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// The data needed to create a [Student].
#[derive(Debug, Clone)]
pub struct NewStudent {
    /// The number given to the student at admission. Must be unique.
    pub admission_number: String,
    /// The student's given name.
    pub first_name: String,
    /// The student's family name.
    pub last_name: String,
    /// The date the student was admitted.
    pub admission_date: Date,
    /// Whether the student is currently enrolled.
    pub status: StudentStatus,
}

/// The student record returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDetails {
    /// The ID of the student.
    pub student_id: StudentId,
    /// The number given to the student at admission.
    pub admission_number: String,
    /// The student's first and last name.
    pub full_name: String,
    /// Whether the student is currently enrolled.
    pub status: StudentStatus,
    /// The date the student was admitted.
    pub admission_date: Date,
}

impl From<&Student> for StudentDetails {
    fn from(student: &Student) -> Self {
        Self {
            student_id: student.id,
            admission_number: student.admission_number.clone(),
            full_name: student.full_name(),
            status: student.status,
            admission_date: student.admission_date,
        }
    }
}

/// Create the student table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_student_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS student (
                id INTEGER PRIMARY KEY,
                admission_number TEXT NOT NULL UNIQUE,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                admission_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Active'
                    CHECK (status IN ('Active', 'Inactive', 'Graduated', 'Withdrawn')),
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

/// Create a new student in the database.
///
/// # Errors
/// Returns an [Error::SqlError] if the admission number is already taken or
/// there is some other SQL error.
pub fn create_student(new_student: NewStudent, connection: &Connection) -> Result<Student, Error> {
    connection.execute(
        "INSERT INTO student (admission_number, first_name, last_name, admission_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &new_student.admission_number,
            &new_student.first_name,
            &new_student.last_name,
            new_student.admission_date,
            new_student.status,
        ),
    )?;

    Ok(Student {
        id: connection.last_insert_rowid(),
        admission_number: new_student.admission_number,
        first_name: new_student.first_name,
        last_name: new_student.last_name,
        admission_date: new_student.admission_date,
        status: new_student.status,
    })
}

fn map_student_row(row: &Row) -> Result<Student, rusqlite::Error> {
    Ok(Student {
        id: row.get(0)?,
        admission_number: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        admission_date: row.get(4)?,
        status: row.get(5)?,
    })
}

/// Retrieve a student from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::StudentNotFound] if `id` does not refer to a student,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_student(id: StudentId, connection: &Connection) -> Result<Student, Error> {
    connection
        .prepare(
            "SELECT id, admission_number, first_name, last_name, admission_date, status
             FROM student WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_student_row)
        .map_err(|error| match error.into() {
            Error::NotFound => Error::StudentNotFound,
            error => error,
        })
}

/// A route handler for looking up a student's record.
///
/// # Errors
/// Returns an [Error::StudentNotFound] if no student has the ID in the path.
pub async fn get_student_details_endpoint(
    State(state): State<AppState>,
    path: Result<Path<StudentId>, PathRejection>,
) -> Result<Json<StudentDetails>, Error> {
    let Path(student_id) = path?;

    let connection = state.connection()?;
    let student = get_student(student_id, &connection)?;

    Ok(Json(StudentDetails::from(&student)))
}
