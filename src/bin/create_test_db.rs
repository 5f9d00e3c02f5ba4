use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::macros::date;

use school_finance::{
    Money, NewAcademicYear, NewStudent, NewUser, PasswordHash, PaymentMethod, Role, StudentStatus,
    Transaction, TransactionType, create_academic_year, create_student, create_transaction,
    create_user, initialize_db, set_annual_fee,
};

/// A utility for creating a test database for the REST API server of school_finance.
///
/// Every seeded user has the password "test".
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test users...");
    let password_hash = PasswordHash::from_raw_password("test", PasswordHash::DEFAULT_COST)?;
    let admin = create_user(
        NewUser {
            username: "admin".to_owned(),
            password_hash: password_hash.clone(),
            full_name: "Ada Admin".to_owned(),
            role: Role::Admin,
        },
        &conn,
    )?;
    let bursar = create_user(
        NewUser {
            username: "bursar".to_owned(),
            password_hash,
            full_name: "Barry Bursar".to_owned(),
            role: Role::NonTeachingStaff,
        },
        &conn,
    )?;

    println!("Creating academic years...");
    let last_year = create_academic_year(
        NewAcademicYear {
            id: Some(2023),
            name: "2023".to_owned(),
            start_date: date!(2023 - 01 - 30),
            end_date: date!(2023 - 12 - 15),
            is_current: false,
        },
        &conn,
    )?;
    let this_year = create_academic_year(
        NewAcademicYear {
            id: Some(2024),
            name: "2024".to_owned(),
            start_date: date!(2024 - 01 - 29),
            end_date: date!(2024 - 12 - 13),
            is_current: true,
        },
        &conn,
    )?;

    println!("Creating students and fee schedules...");
    let students = [
        ("ADM-001", "Aroha", "Ngata", StudentStatus::Active),
        ("ADM-002", "Ben", "Carter", StudentStatus::Active),
        ("ADM-003", "Chloe", "Smith", StudentStatus::Inactive),
        ("ADM-004", "Daniel", "Lee", StudentStatus::Graduated),
    ];

    for (admission_number, first_name, last_name, status) in students {
        let student = create_student(
            NewStudent {
                admission_number: admission_number.to_owned(),
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
                admission_date: date!(2023 - 01 - 30),
                status,
            },
            &conn,
        )?;

        set_annual_fee(
            student.id,
            last_year.id,
            Money::from_cents(110_000),
            None,
            &conn,
        )?;
        set_annual_fee(
            student.id,
            this_year.id,
            Money::from_cents(120_000),
            None,
            &conn,
        )?;

        create_transaction(
            Transaction::build(
                TransactionType::FeePayment,
                Money::from_cents(100_000),
                date!(2023 - 03 - 01),
                bursar.id,
            )
            .student_id(Some(student.id))
            .year_id(Some(last_year.id))
            .payment_method(Some(PaymentMethod::BankTransfer)),
            &conn,
        )?;
        create_transaction(
            Transaction::build(
                TransactionType::FeeCarryForward,
                Money::from_cents(10_000),
                date!(2024 - 01 - 29),
                admin.id,
            )
            .student_id(Some(student.id))
            .year_id(Some(this_year.id))
            .description(Some("Unpaid fees from 2023".to_owned())),
            &conn,
        )?;
        create_transaction(
            Transaction::build(
                TransactionType::FeePayment,
                Money::from_cents(50_000),
                date!(2024 - 03 - 01),
                bursar.id,
            )
            .student_id(Some(student.id))
            .year_id(Some(this_year.id))
            .payment_method(Some(PaymentMethod::Cash)),
            &conn,
        )?;
    }

    println!("Creating school income and expenses...");
    create_transaction(
        Transaction::build(
            TransactionType::Expense,
            Money::from_cents(45_999),
            date!(2024 - 02 - 14),
            bursar.id,
        )
        .category(Some("Stationery".to_owned()))
        .description(Some("Exercise books".to_owned())),
        &conn,
    )?;
    create_transaction(
        Transaction::build(
            TransactionType::Income,
            Money::from_cents(250_000),
            date!(2024 - 04 - 20),
            admin.id,
        )
        .category(Some("Fundraising".to_owned()))
        .description(Some("School fair".to_owned())),
        &conn,
    )?;

    println!("Success! Log in as \"admin\" or \"bursar\" with the password \"test\".");

    Ok(())
}
