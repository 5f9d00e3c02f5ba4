//! Code for creating the user table and fetching users from the database.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash, sql_enum::impl_text_column};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The job a staff member does at the school.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Role {
    /// Can do everything, including creating other users.
    Admin,
    /// A teacher.
    #[serde(rename = "Teaching Staff")]
    TeachingStaff,
    /// Office, grounds and other support staff.
    #[serde(rename = "Non-Teaching Staff")]
    NonTeachingStaff,
}

impl Role {
    /// The label used for the role in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::TeachingStaff => "Teaching Staff",
            Role::NonTeachingStaff => "Non-Teaching Staff",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Teaching Staff" => Ok(Role::TeachingStaff),
            "Non-Teaching Staff" => Ok(Role::NonTeachingStaff),
            other => Err(Error::InvalidInput(format!("unknown role \"{other}\""))),
        }
    }
}

impl_text_column!(Role);

/// A staff member who can log in to the application.
///
/// The caller should ensure that `id` and `username` are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's name as shown on transaction records.
    pub full_name: String,
    /// What the user does at the school.
    pub role: Role,
    /// Inactive users cannot log in or use existing tokens.
    pub is_active: bool,
}

/// The data needed to create a [User].
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The name the user logs in with. Must be unique.
    pub username: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's name as shown on transaction records.
    pub full_name: String,
    /// What the user does at the school.
    pub role: Role,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('Admin', 'Teaching Staff', 'Non-Teaching Staff')),
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if the username is taken, in which case the
///   existing user is left untouched,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, password, full_name, role) VALUES (?1, ?2, ?3, ?4)",
        (
            &new_user.username,
            new_user.password_hash.as_ref(),
            &new_user.full_name,
            new_user.role,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: new_user.username,
        password_hash: new_user.password_hash,
        full_name: new_user.full_name,
        role: new_user.role,
        is_active: true,
    })
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        full_name: row.get(3)?,
        role: row.get(4)?,
        is_active: row.get(5)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(
            "SELECT id, username, password, full_name, role, is_active FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with the login name `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(
            "SELECT id, username, password, full_name, role, is_active FROM user \
            WHERE username = :username",
        )?
        .query_row(&[(":username", username)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        user::{NewUser, Role, UserID, count_users, create_user, get_user_by_id},
    };

    use super::{Error, create_user_table, get_user_by_username};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            full_name: "Ada Lovelace".to_owned(),
            role: Role::TeachingStaff,
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("ada"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.username, "ada");
        assert_eq!(
            inserted_user.password_hash,
            PasswordHash::new_unchecked("hunter2")
        );
        assert_eq!(inserted_user.role, Role::TeachingStaff);
        assert!(inserted_user.is_active);
    }

    #[test]
    fn insert_duplicate_username_fails_and_keeps_existing_user() {
        let db_connection = get_db_connection();
        let original = create_user(new_user("ada"), &db_connection).unwrap();

        let duplicate = create_user(
            NewUser {
                full_name: "Someone Else".to_owned(),
                password_hash: PasswordHash::new_unchecked("other"),
                role: Role::Admin,
                ..new_user("ada")
            },
            &db_connection,
        );

        assert_eq!(duplicate, Err(Error::DuplicateUsername));
        assert_eq!(get_user_by_id(original.id, &db_connection), Ok(original));
        assert_eq!(count_users(&db_connection), Ok(1));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("ada"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_username_succeeds() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("ada"), &db_connection).unwrap();

        assert_eq!(get_user_by_username("ada", &db_connection), Ok(test_user));
        assert_eq!(
            get_user_by_username("grace", &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn returns_correct_count() {
        let db_connection = get_db_connection();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(0, count, "Want zero users before insertion, got {count}");

        create_user(new_user("ada"), &db_connection).unwrap();

        let count = count_users(&db_connection).expect("Could not get user count");
        assert_eq!(1, count, "Want one user after insertion, got {count}");
    }

    #[test]
    fn role_labels_round_trip_through_json() {
        let json = serde_json::to_string(&Role::NonTeachingStaff).unwrap();

        assert_eq!(json, "\"Non-Teaching Staff\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"Teaching Staff\"").unwrap(),
            Role::TeachingStaff
        );
        assert!(serde_json::from_str::<Role>("\"Janitor\"").is_err());
    }
}
