//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    academic_year::create_academic_year_table, annual_fee::create_annual_fee_table,
    student::create_student_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create all the tables for the application, if they do not already exist.
///
/// Foreign key enforcement is switched on for `connection` first since SQLite
/// leaves it off by default.
///
/// # Errors
/// Returns an error if a table could not be created or the transaction could
/// not be committed.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_student_table(&transaction)?;
    create_academic_year_table(&transaction)?;
    create_annual_fee_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
