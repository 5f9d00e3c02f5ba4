//! Transaction management for the finance service.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing and querying transactions
//! - The fee payment and transaction history endpoints

mod core;
mod fee_payment;
mod history;

pub use core::{
    PaymentMethod, Transaction, TransactionBuilder, TransactionType, create_transaction,
    create_transaction_table, sum_student_transactions,
};
pub use fee_payment::{FeePaymentRequest, FeePaymentResponse, record_fee_payment};
pub use history::{
    DateRange, HistoryQuery, TransactionRecord, get_transaction_history,
    get_transaction_history_endpoint,
};

#[cfg(test)]
pub use core::{count_transactions, get_transaction};
