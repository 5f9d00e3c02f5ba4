//! A client for the finance service.
//!
//! The client keeps the login state in an explicit [Session] that is passed to
//! every request, converts form input with the functions in [form], and
//! reports every failure as a [ClientError] that displays as one line.
//!
//! ```ignore
//! let client = FinanceClient::new("http://127.0.0.1:3000");
//! let session = client.log_in("bursar", "hunter2").await?;
//! let payment = FeePaymentForm { /* fields typed by the user */ }.to_request()?;
//! client.record_fee_payment(&session, &payment).await?;
//! ```

mod api;
mod error;
pub mod form;
mod session;

pub use api::FinanceClient;
pub use error::ClientError;
pub use form::FeePaymentForm;
pub use session::{Session, SessionStore};
