//! Authentication middleware that validates bearer tokens.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, User,
    app_state::lock_connection,
    auth::token::{TokenKeys, decode_token},
    user::get_user_by_id,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The keys for verifying access tokens.
    pub token_keys: TokenKeys,
    /// The database connection, used to check that the token's user still exists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Check the bearer token and load the user it was issued to.
///
/// The user must still exist, be active, and have the same username as the
/// token's subject.
fn authenticate(bearer_token: &str, state: &AuthState) -> Result<User, Error> {
    let claims = decode_token(bearer_token, &state.token_keys)?;

    let connection = lock_connection(&state.db_connection)?;

    let user = match get_user_by_id(claims.user_id, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidToken),
        Err(error) => return Err(error),
    };

    if !user.is_active || user.username != claims.sub {
        tracing::warn!("Rejected token for inactive or renamed user {}", user.id);
        return Err(Error::InvalidToken);
    }

    Ok(user)
}

/// Middleware function that checks for a valid bearer token in the `Authorization` header.
/// The authenticated [User] is placed into the request and then the request executed normally
/// if the token is valid, otherwise a 401 response with a JSON `detail` is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<User>` to receive the user.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state)
        .await
    {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(error) => {
            tracing::debug!("Missing or malformed authorization header: {error}");
            return Error::InvalidToken.into_response();
        }
    };

    let user = match authenticate(bearer.token(), &state) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(user);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
