//! Defines the core data models and database queries for transactions.

use std::str::FromStr;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, Money,
    database_id::{StudentId, TransactionId, YearId},
    sql_enum::impl_text_column,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// What kind of money movement a transaction records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    /// A student (or their family) paid some of their fees.
    #[serde(rename = "Fee Payment")]
    FeePayment,
    /// The school spent money.
    Expense,
    /// The school received money other than fees, e.g. a donation.
    Income,
    /// Fees left unpaid from an earlier year that are now owed in this year.
    #[serde(rename = "Fee Carry Forward")]
    FeeCarryForward,
}

impl TransactionType {
    /// The label used for the transaction type in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::FeePayment => "Fee Payment",
            TransactionType::Expense => "Expense",
            TransactionType::Income => "Income",
            TransactionType::FeeCarryForward => "Fee Carry Forward",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Fee Payment" => Ok(TransactionType::FeePayment),
            "Expense" => Ok(TransactionType::Expense),
            "Income" => Ok(TransactionType::Income),
            "Fee Carry Forward" => Ok(TransactionType::FeeCarryForward),
            other => Err(Error::InvalidInput(format!(
                "unknown transaction type \"{other}\""
            ))),
        }
    }
}

impl_text_column!(TransactionType);

/// How money was paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Notes and coins.
    Cash,
    /// A direct transfer between bank accounts.
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    /// A card or mobile payment.
    Online,
    /// A paper cheque.
    Cheque,
}

impl PaymentMethod {
    /// All payment methods, in the order they should be offered to users.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::BankTransfer,
        PaymentMethod::Online,
        PaymentMethod::Cheque,
    ];

    /// The label used for the payment method in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Online => "Online",
            PaymentMethod::Cheque => "Cheque",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| {
                let options = PaymentMethod::ALL.map(|method| method.as_str()).join(", ");
                Error::InvalidInput(format!(
                    "unknown payment method \"{s}\", expected one of: {options}"
                ))
            })
    }
}

impl_text_column!(PaymentMethod);

/// A movement of money recorded by a staff member.
///
/// Transactions are never edited or deleted once created.
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// What kind of money movement this is.
    pub transaction_type: TransactionType,
    /// How much money moved. Always positive; the type gives the direction.
    pub amount: Money,
    /// When the money moved.
    pub date: Date,
    /// The student the transaction is for, if any.
    pub student_id: Option<StudentId>,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// A free text category, e.g. "Stationery".
    pub category: Option<String>,
    /// How the money was paid, if applicable.
    pub payment_method: Option<PaymentMethod>,
    /// E.g. a receipt or cheque number.
    pub reference_details: Option<String>,
    /// The staff member who recorded the transaction.
    pub recorded_by: UserID,
    /// The academic year the transaction counts towards, if any.
    pub year_id: Option<YearId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: Money,
        date: Date,
        recorded_by: UserID,
    ) -> TransactionBuilder {
        TransactionBuilder {
            transaction_type,
            amount,
            date,
            recorded_by,
            student_id: None,
            year_id: None,
            description: None,
            category: None,
            payment_method: None,
            reference_details: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// The required fields are given to [Transaction::build] and the optional
/// fields default to `None`. Pass the finished builder to [create_transaction].
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// let payment = Transaction::build(
///         TransactionType::FeePayment,
///         Money::from_cents(50_000),
///         date!(2024 - 03 - 01),
///         clerk.id,
///     )
///     .student_id(Some(42))
///     .year_id(Some(2024))
///     .payment_method(Some(PaymentMethod::Cash));
/// let payment = create_transaction(payment, &connection)?;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// What kind of money movement this is.
    pub transaction_type: TransactionType,
    /// How much money moved.
    pub amount: Money,
    /// When the money moved.
    pub date: Date,
    /// The staff member recording the transaction.
    pub recorded_by: UserID,
    /// The student the transaction is for.
    pub student_id: Option<StudentId>,
    /// The academic year the transaction counts towards.
    ///
    /// Fee payments and carry forwards only count towards a student's fee
    /// summary when this is set.
    pub year_id: Option<YearId>,
    /// A text description of what the transaction was for.
    pub description: Option<String>,
    /// A free text category.
    pub category: Option<String>,
    /// How the money was paid.
    pub payment_method: Option<PaymentMethod>,
    /// E.g. a receipt or cheque number.
    pub reference_details: Option<String>,
}

impl TransactionBuilder {
    /// Set the student the transaction is for.
    pub fn student_id(mut self, student_id: Option<StudentId>) -> Self {
        self.student_id = student_id;
        self
    }

    /// Set the academic year the transaction counts towards.
    pub fn year_id(mut self, year_id: Option<YearId>) -> Self {
        self.year_id = year_id;
        self
    }

    /// Set the description for the transaction.
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// Set how the money was paid.
    pub fn payment_method(mut self, payment_method: Option<PaymentMethod>) -> Self {
        self.payment_method = payment_method;
        self
    }

    /// Set the reference details, e.g. a receipt number.
    pub fn reference_details(mut self, reference_details: Option<String>) -> Self {
        self.reference_details = reference_details;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::AmountOutOfRange] if the amount is larger than [Money::MAX],
/// - [Error::InvalidForeignKey] if the student, year or user does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if !builder.amount.is_positive() {
        return Err(Error::NonPositiveAmount);
    }

    if !builder.amount.is_in_range() {
        return Err(Error::AmountOutOfRange);
    }

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (transaction_type, amount, date, student_id, description,
                category, payment_method, reference_details, recorded_by, year_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING id, transaction_type, amount, date, student_id, description, category,
                payment_method, reference_details, recorded_by, year_id",
        )?
        .query_row(
            (
                builder.transaction_type,
                builder.amount,
                builder.date,
                builder.student_id,
                builder.description,
                builder.category,
                builder.payment_method,
                builder.reference_details,
                builder.recorded_by.as_i64(),
                builder.year_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
#[cfg(test)]
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, transaction_type, amount, date, student_id, description, category,
                payment_method, reference_details, recorded_by, year_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Add up the amounts of the transactions of `transaction_type` recorded for
/// `student_id` in `year_id`.
///
/// Returns zero if there are no such transactions.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn sum_student_transactions(
    student_id: StudentId,
    year_id: YearId,
    transaction_type: TransactionType,
    connection: &Connection,
) -> Result<Money, Error> {
    connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\"
             WHERE student_id = ?1 AND year_id = ?2 AND transaction_type = ?3",
        )?
        .query_row((student_id, year_id, transaction_type), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_type TEXT NOT NULL
                    CHECK (transaction_type IN ('Fee Payment', 'Expense', 'Income', 'Fee Carry Forward')),
                amount INTEGER NOT NULL CHECK (amount > 0),
                date TEXT NOT NULL,
                student_id INTEGER,
                description TEXT,
                category TEXT,
                payment_method TEXT
                    CHECK (payment_method IN ('Cash', 'Bank Transfer', 'Online', 'Cheque')),
                reference_details TEXT,
                recorded_by INTEGER NOT NULL,
                year_id INTEGER,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(student_id) REFERENCES student(id) ON UPDATE CASCADE,
                FOREIGN KEY(recorded_by) REFERENCES user(id) ON UPDATE CASCADE,
                FOREIGN KEY(year_id) REFERENCES academic_year(id) ON UPDATE CASCADE
                )",
        (),
    )?;

    // Used by the history listing and the fee summary.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_student_year
            ON \"transaction\"(student_id, year_id, transaction_type);",
        (),
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        transaction_type: row.get(1)?,
        amount: row.get(2)?,
        date: row.get(3)?,
        student_id: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        payment_method: row.get(7)?,
        reference_details: row.get(8)?,
        recorded_by: UserID::new(row.get(9)?),
        year_id: row.get(10)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
