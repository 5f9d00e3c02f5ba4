//! Shared fixtures for the unit tests.

#![allow(missing_docs)]

use axum_test::TestServer;
use rusqlite::Connection;
use time::{Date, Month, macros::date};

use crate::{
    AppState, PasswordHash, TokenResponse,
    academic_year::{AcademicYear, NewAcademicYear, create_academic_year},
    endpoints,
    student::{NewStudent, Student, StudentStatus, create_student},
    user::{NewUser, Role, User, create_user},
};

/// Bcrypt cost for tests. The minimum allowed, so tests stay fast.
pub(crate) const TEST_HASH_COST: u32 = 4;

pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "42")
        .expect("Could not create app state")
        .with_password_hash_cost(TEST_HASH_COST)
}

pub(crate) fn insert_test_user(
    state: &AppState,
    username: &str,
    password: &str,
    role: Role,
) -> User {
    create_user(
        NewUser {
            username: username.to_owned(),
            password_hash: PasswordHash::from_raw_password(password, TEST_HASH_COST)
                .expect("Could not hash password"),
            full_name: format!("{username} McTest"),
            role,
        },
        &state.connection().expect("Could not lock database"),
    )
    .expect("Could not create test user")
}

pub(crate) fn insert_test_student(
    state: &AppState,
    admission_number: &str,
    first_name: &str,
    last_name: &str,
) -> Student {
    create_student(
        NewStudent {
            admission_number: admission_number.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            admission_date: date!(2023 - 01 - 30),
            status: StudentStatus::Active,
        },
        &state.connection().expect("Could not lock database"),
    )
    .expect("Could not create test student")
}

pub(crate) fn insert_test_year(state: &AppState, year: i32) -> AcademicYear {
    seed_year(&state.connection().expect("Could not lock database"), year)
}

/// Log in through the API and return the access token.
pub(crate) async fn log_in(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post(endpoints::LOG_IN)
        .form(&[("username", username), ("password", password)])
        .await;
    response.assert_status_ok();

    response.json::<TokenResponse>().access_token
}

/// Insert a user with the password "hunter2" without going through bcrypt.
pub(crate) fn seed_user(connection: &Connection, username: &str) -> User {
    create_user(
        NewUser {
            username: username.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            full_name: format!("{username} McTest"),
            role: Role::NonTeachingStaff,
        },
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn seed_student(connection: &Connection, admission_number: &str) -> Student {
    create_student(
        NewStudent {
            admission_number: admission_number.to_owned(),
            first_name: "Test".to_owned(),
            last_name: admission_number.to_owned(),
            admission_date: date!(2023 - 01 - 30),
            status: StudentStatus::Active,
        },
        connection,
    )
    .expect("Could not create test student")
}

/// Create the calendar year `year` as an academic year whose ID is `year`.
pub(crate) fn seed_year(connection: &Connection, year: i32) -> AcademicYear {
    create_academic_year(
        NewAcademicYear {
            id: Some(year as i64),
            name: year.to_string(),
            start_date: Date::from_calendar_date(year, Month::January, 1)
                .expect("Invalid year"),
            end_date: Date::from_calendar_date(year, Month::December, 31)
                .expect("Invalid year"),
            is_current: false,
        },
        connection,
    )
    .expect("Could not create test academic year")
}
