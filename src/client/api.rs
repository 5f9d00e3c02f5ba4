use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use time::Date;

use crate::{
    FeePaymentRequest, FeePaymentResponse, FeeSummary, HistoryQuery, SignUpRequest,
    StudentDetails, StudentId, TokenResponse, TransactionRecord, UserResponse, YearId,
    endpoints::{self, format_endpoint},
};

use super::{ClientError, Session};

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Deserialize)]
struct WelcomeBody {
    message: String,
}

/// Talks to the finance service over HTTP.
///
/// The client holds no login state of its own. Every call that needs a token
/// takes the caller's [Session].
#[derive(Debug, Clone)]
pub struct FinanceClient {
    http: Client,
    base_url: String,
}

impl FinanceClient {
    /// Create a client for the service at `base_url`, e.g. "http://127.0.0.1:3000".
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();

        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// The address of the service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(
        &self,
        request: RequestBuilder,
        session: &Session,
    ) -> Result<RequestBuilder, ClientError> {
        Ok(request.bearer_auth(session.token()?))
    }

    /// Get the service's welcome message. Useful to check the server is up.
    ///
    /// # Errors
    /// Returns an error if the server cannot be reached or answers with an error.
    pub async fn welcome(&self) -> Result<String, ClientError> {
        let body: WelcomeBody = send(self.http.get(self.url(endpoints::ROOT))).await?;

        Ok(body.message)
    }

    /// Log in and return the new session.
    ///
    /// # Errors
    /// Returns [ClientError::LoginFailed] if the server rejects the credentials.
    pub async fn log_in(&self, username: &str, password: &str) -> Result<Session, ClientError> {
        let request = self
            .http
            .post(self.url(endpoints::LOG_IN))
            .form(&[("username", username), ("password", password)]);

        let token: TokenResponse = send(request).await.map_err(|error| match error {
            ClientError::Api { detail, .. } => ClientError::LoginFailed(detail),
            error => error,
        })?;

        tracing::debug!("Logged in as {username}");

        Ok(Session::Authenticated {
            token: token.access_token,
            username: username.to_owned(),
        })
    }

    /// Create a new user. Only administrators may do this.
    ///
    /// The new user is not logged in.
    ///
    /// # Errors
    /// Returns an error if not logged in, not an administrator, or the
    /// username is taken.
    pub async fn sign_up(
        &self,
        session: &Session,
        new_user: &SignUpRequest,
    ) -> Result<UserResponse, ClientError> {
        let request = self.authorized(self.http.post(self.url(endpoints::SIGN_UP)), session)?;

        send(request.json(new_user)).await
    }

    /// Record a fee payment as the logged in user.
    ///
    /// # Errors
    /// Returns an error if not logged in, the payment is invalid, or the
    /// student or academic year does not exist.
    pub async fn record_fee_payment(
        &self,
        session: &Session,
        payment: &FeePaymentRequest,
    ) -> Result<FeePaymentResponse, ClientError> {
        let request =
            self.authorized(self.http.post(self.url(endpoints::FEE_PAYMENT)), session)?;

        send(request.json(payment)).await
    }

    /// Look up a student's record.
    ///
    /// # Errors
    /// Returns an error if not logged in or the student does not exist.
    pub async fn student_details(
        &self,
        session: &Session,
        student_id: StudentId,
    ) -> Result<StudentDetails, ClientError> {
        let path = format_endpoint(endpoints::STUDENT_DETAILS, &[student_id]);
        let request = self.authorized(self.http.get(self.url(&path)), session)?;

        send(request).await
    }

    /// Get a student's fee summary for an academic year.
    ///
    /// # Errors
    /// Returns an error if not logged in, or the student, year or fee record
    /// does not exist.
    pub async fn fee_summary(
        &self,
        session: &Session,
        student_id: StudentId,
        year_id: YearId,
    ) -> Result<FeeSummary, ClientError> {
        let path = format_endpoint(endpoints::FEE_SUMMARY, &[student_id, year_id]);
        let request = self.authorized(self.http.get(self.url(&path)), session)?;

        send(request).await
    }

    /// List the transactions dated from `start_date` to `end_date` inclusive.
    ///
    /// # Errors
    /// Returns an error if not logged in or `start_date` is after `end_date`.
    pub async fn transaction_history(
        &self,
        session: &Session,
        start_date: Date,
        end_date: Date,
    ) -> Result<Vec<TransactionRecord>, ClientError> {
        let request = self.authorized(
            self.http.get(self.url(endpoints::TRANSACTION_HISTORY)),
            session,
        )?;

        send(request.query(&HistoryQuery {
            start_date,
            end_date,
        }))
        .await
    }
}

/// Send `request` and decode a successful JSON response body.
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }

    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|error| {
        tracing::error!("Could not parse response body {body:?}: {error}");
        ClientError::MalformedResponse(error.to_string())
    })
}

async fn error_from_response(response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error_body) => error_body.detail,
        Err(_) if !body.trim().is_empty() => body,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_owned(),
    };

    tracing::debug!("Request failed with status {status}: {detail}");

    ClientError::Api { status, detail }
}
