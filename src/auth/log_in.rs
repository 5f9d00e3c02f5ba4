//! Handles log-in requests and hands out access tokens.

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::token::encode_token,
    user::{User, get_user_by_username},
};

/// The credentials submitted in the URL encoded log-in form.
///
/// Extra fields sent by OAuth2 password-flow clients (e.g. `grant_type`,
/// `scope`) are ignored.
#[derive(Clone, Deserialize, Serialize)]
pub struct LogInData {
    /// The name the user logs in with.
    pub username: String,
    /// Password entered during log-in.
    pub password: String,
}

/// The body of a successful log-in response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The bearer token to send in the `Authorization` header of later requests.
    pub access_token: String,
    /// Always "bearer".
    pub token_type: String,
}

/// Check the credentials against the user table.
///
/// An unknown username and a wrong password produce the same error so that
/// clients cannot discover which usernames exist.
fn verify_credentials(user_data: &LogInData, state: &AppState) -> Result<User, Error> {
    let connection = state.connection()?;

    let user = match get_user_by_username(user_data.username.trim(), &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };
    drop(connection);

    let password_is_correct = user.password_hash.verify(&user_data.password).map_err(|e| {
        tracing::error!("Error verifying password: {}", e);
        Error::HashingError(e.to_string())
    })?;

    if !password_is_correct || !user.is_active {
        return Err(Error::InvalidCredentials);
    }

    Ok(user)
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, a bearer token is returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The form is missing the username or password.
/// - The username does not belong to a registered, active user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password or signing the token.
pub async fn post_log_in(
    State(state): State<AppState>,
    form: Result<Form<LogInData>, FormRejection>,
) -> Result<Json<TokenResponse>, Error> {
    let Form(user_data) = form?;

    let user = verify_credentials(&user_data, &state).inspect_err(|error| {
        if *error == Error::InvalidCredentials {
            tracing::info!("Failed log-in attempt for {:?}", user_data.username);
        }
    })?;

    let access_token = encode_token(
        &user,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.token_keys,
    )?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_owned(),
    }))
}

#[cfg(test)]
mod log_in_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;

    use crate::{
        AppState, Role,
        auth::{
            log_in::{LogInData, TokenResponse, post_log_in},
            token::decode_token,
        },
        endpoints,
        test_utils::{get_test_state, insert_test_user},
    };

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in))
            .with_state(state);

        TestServer::new(app)
    }

    fn credentials(username: &str, password: &str) -> LogInData {
        LogInData {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state();
        let user = insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::LOG_IN)
            .form(&credentials("bursar", "hunter2"))
            .await;

        response.assert_status(StatusCode::OK);
        let token: TokenResponse = response.json();
        assert_eq!(token.token_type, "bearer");
        let claims = decode_token(&token.access_token, &state.token_keys).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.sub, "bursar");
    }

    #[tokio::test]
    async fn log_in_ignores_surrounding_whitespace_in_username() {
        let state = get_test_state();
        let user = insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::LOG_IN)
            .form(&credentials("  bursar ", "hunter2"))
            .await;

        response.assert_status(StatusCode::OK);
        let token: TokenResponse = response.json();
        let claims = decode_token(&token.access_token, &state.token_keys).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.sub, "bursar");
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let state = get_test_state();
        insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        let server = get_test_server(state);

        let response = server
            .post(endpoints::LOG_IN)
            .form(&credentials("bursar", "hunter3"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["detail"], "Incorrect username or password");
        assert!(body.get("access_token").is_none());
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::LOG_IN)
            .form(&credentials("nobody", "hunter2"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["detail"], "Incorrect username or password");
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::LOG_IN)
            .form(&[("username", "bursar")])
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn log_in_fails_for_inactive_user() {
        let state = get_test_state();
        let user = insert_test_user(&state, "bursar", "hunter2", Role::NonTeachingStaff);
        state
            .connection()
            .unwrap()
            .execute("UPDATE user SET is_active = 0 WHERE id = ?1", (user.id.as_i64(),))
            .unwrap();
        let server = get_test_server(state);

        server
            .post(endpoints::LOG_IN)
            .form(&credentials("bursar", "hunter2"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
