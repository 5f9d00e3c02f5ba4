//! Handles requests from administrators to create new user accounts.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash,
    user::{NewUser, Role, User, UserID, create_user},
};

/// The details for a new user account.
#[derive(Clone, Deserialize, Serialize)]
pub struct SignUpRequest {
    /// The name the new user will log in with.
    pub username: String,
    /// The new user's password in plain text.
    pub password: String,
    /// The new user's name as shown on transaction records.
    pub full_name: String,
    /// What the new user does at the school.
    pub role: Role,
}

/// The public details of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    /// The ID of the user.
    pub user_id: UserID,
    /// The name the user logs in with.
    pub username: String,
    /// The user's name as shown on transaction records.
    pub full_name: String,
    /// What the user does at the school.
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role,
        }
    }
}

fn require_non_empty(value: &str, field_name: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{field_name} cannot be empty.")));
    }

    Ok(())
}

/// A route handler for creating a new user.
///
/// Only administrators may create users. The new user does not get a token;
/// they must log in separately.
///
/// # Errors
///
/// This function will return an error if:
/// - the current user is not an administrator,
/// - the username, password or full name is empty,
/// - the username is already taken,
/// - or the password could not be hashed.
pub async fn post_sign_up(
    State(state): State<AppState>,
    Extension(current_user): Extension<User>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    if current_user.role != Role::Admin {
        tracing::warn!(
            "User {} tried to create a user without admin rights",
            current_user.id
        );
        return Err(Error::Forbidden(
            "Only administrators can create users".to_owned(),
        ));
    }

    let Json(request) = payload?;

    let username = request.username.trim();
    let full_name = request.full_name.trim();
    require_non_empty(username, "Username")?;
    require_non_empty(full_name, "Full name")?;

    let password_hash = PasswordHash::from_raw_password(&request.password, state.password_hash_cost)?;

    let connection = state.connection()?;
    let user = create_user(
        NewUser {
            username: username.to_owned(),
            password_hash,
            full_name: full_name.to_owned(),
            role: request.role,
        },
        &connection,
    )?;

    tracing::info!("User {} created user {}", current_user.id, user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}
