//! Turns the text a user typed into the typed requests the API expects.

use std::str::FromStr;

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{FeePaymentRequest, Money, PaymentMethod};

use super::ClientError;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Parse a whole number ID such as a student ID.
///
/// # Errors
/// Returns [ClientError::InvalidInput] naming `field` if `raw` is not an integer.
pub fn parse_id(field: &str, raw: &str) -> Result<i64, ClientError> {
    raw.trim()
        .parse()
        .map_err(|_| ClientError::InvalidInput(format!("{field} must be a whole number.")))
}

/// Parse a decimal amount of money, e.g. "500" or "1234.50".
///
/// Amounts are rounded to the nearest cent and must be greater than zero.
///
/// # Errors
/// Returns [ClientError::InvalidInput] if `raw` is not a positive decimal number.
pub fn parse_amount(raw: &str) -> Result<Money, ClientError> {
    let amount = Money::from_str(raw.trim()).map_err(|_| {
        ClientError::InvalidInput("Amount must be a number, e.g. 500.00.".to_owned())
    })?;

    if !amount.is_positive() {
        return Err(ClientError::InvalidInput(
            "Amount must be greater than zero.".to_owned(),
        ));
    }

    Ok(amount)
}

/// Parse a calendar date written as YYYY-MM-DD.
///
/// # Errors
/// Returns [ClientError::InvalidInput] naming `field` if `raw` is not a valid date.
pub fn parse_date(field: &str, raw: &str) -> Result<Date, ClientError> {
    Date::parse(raw.trim(), DATE_FORMAT).map_err(|_| {
        ClientError::InvalidInput(format!("{field} must be a date in the form YYYY-MM-DD."))
    })
}

/// Parse one of the payment method labels, e.g. "Bank Transfer".
///
/// # Errors
/// Returns [ClientError::InvalidInput] listing the valid labels.
pub fn parse_payment_method(raw: &str) -> Result<PaymentMethod, ClientError> {
    PaymentMethod::from_str(raw.trim()).map_err(|_| {
        let options = PaymentMethod::ALL.map(|method| method.as_str()).join(", ");
        ClientError::InvalidInput(format!("Payment method must be one of: {options}."))
    })
}

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// The fee payment form as the user filled it in.
#[derive(Debug, Clone, Default)]
pub struct FeePaymentForm {
    /// The student's ID.
    pub student_id: String,
    /// The amount paid.
    pub amount: String,
    /// The payment date as YYYY-MM-DD.
    pub transaction_date: String,
    /// One of the payment method labels.
    pub payment_method: String,
    /// The academic year's ID.
    pub year_id: String,
    /// Optional receipt or cheque number. Blank means none.
    pub reference_details: String,
    /// Optional notes. Blank means none.
    pub description: String,
}

impl FeePaymentForm {
    /// Convert the form into a request, checking every field.
    ///
    /// # Errors
    /// Returns [ClientError::InvalidInput] for the first field that is invalid.
    pub fn to_request(&self) -> Result<FeePaymentRequest, ClientError> {
        Ok(FeePaymentRequest {
            student_id: parse_id("Student ID", &self.student_id)?,
            amount: parse_amount(&self.amount)?,
            transaction_date: parse_date("Payment date", &self.transaction_date)?,
            payment_method: parse_payment_method(&self.payment_method)?,
            year_id: parse_id("Academic year ID", &self.year_id)?,
            reference_details: optional_text(&self.reference_details),
            description: optional_text(&self.description),
        })
    }
}
