use std::{io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use school_finance::{
    Role, SignUpRequest,
    client::{
        ClientError, FeePaymentForm, FinanceClient, Session, SessionStore,
        form::{parse_date, parse_id},
    },
};

/// Command line client for the school finance service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The address of the finance service.
    #[arg(long, env = "FINANCE_API_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Where to keep the login session. Defaults to ~/.school_finance/session.json.
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the service is reachable.
    Ping,
    /// Log in and remember the session. Prompts for the password.
    Login {
        /// The name to log in with.
        username: String,
    },
    /// Forget the current session.
    Logout,
    /// Show who is logged in.
    Whoami,
    /// Record a student's fee payment.
    Pay {
        /// The student's ID.
        #[arg(long)]
        student_id: String,
        /// The amount paid, e.g. 500.00.
        #[arg(long)]
        amount: String,
        /// The payment date as YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// One of Cash, "Bank Transfer", Online or Cheque.
        #[arg(long, default_value = "Cash")]
        method: String,
        /// The academic year's ID.
        #[arg(long)]
        year_id: String,
        /// A receipt or cheque number.
        #[arg(long, default_value = "")]
        reference: String,
        /// Notes about the payment.
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show a student's record.
    Student {
        /// The student's ID.
        student_id: String,
    },
    /// Show how much a student has paid and still owes for a year.
    Summary {
        /// The student's ID.
        student_id: String,
        /// The academic year's ID.
        year_id: String,
    },
    /// List the transactions between two dates, inclusive.
    History {
        /// The first day as YYYY-MM-DD.
        #[arg(long)]
        start: String,
        /// The last day as YYYY-MM-DD.
        #[arg(long)]
        end: String,
    },
    /// Create a new user. Administrators only. Prompts for the new user's password.
    AddUser {
        /// The name the new user will log in with.
        username: String,
        /// The new user's name as shown on transaction records.
        #[arg(long)]
        full_name: String,
        /// One of "Admin", "Teaching Staff" or "Non-Teaching Staff".
        #[arg(long, default_value = "Teaching Staff")]
        role: Role,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), ClientError> {
    let session_path = match args.session_file.or_else(SessionStore::default_path) {
        Some(path) => path,
        None => {
            return Err(ClientError::InvalidInput(
                "Could not find the home directory, use --session-file.".to_owned(),
            ));
        }
    };
    let store = SessionStore::new(session_path);
    let client = FinanceClient::new(args.base_url);

    match args.command {
        Command::Ping => println!("{}", client.welcome().await?),
        Command::Login { username } => {
            let password = prompt_password("Password: ")?;
            let session = client.log_in(&username, &password).await?;
            store.save(&session)?;
            println!("Logged in as {username}");
        }
        Command::Logout => {
            store.clear()?;
            println!("Logged out");
        }
        Command::Whoami => match store.load()? {
            Session::Anonymous => println!("Not logged in"),
            Session::Authenticated { username, .. } => println!("{username}"),
        },
        Command::Pay {
            student_id,
            amount,
            date,
            method,
            year_id,
            reference,
            description,
        } => {
            let payment = FeePaymentForm {
                student_id,
                amount,
                transaction_date: date,
                payment_method: method,
                year_id,
                reference_details: reference,
                description,
            }
            .to_request()?;
            let session = store.load()?;
            let response = client.record_fee_payment(&session, &payment).await?;
            println!(
                "{} (transaction {})",
                response.message, response.transaction_id
            );
        }
        Command::Student { student_id } => {
            let student_id = parse_id("Student ID", &student_id)?;
            let session = store.load()?;
            let student = client.student_details(&session, student_id).await?;
            println!(
                "{} {} ({}), admitted {}, {}",
                student.student_id,
                student.full_name,
                student.admission_number,
                student.admission_date,
                student.status.as_str()
            );
        }
        Command::Summary {
            student_id,
            year_id,
        } => {
            let student_id = parse_id("Student ID", &student_id)?;
            let year_id = parse_id("Academic year ID", &year_id)?;
            let session = store.load()?;
            let summary = client.fee_summary(&session, student_id, year_id).await?;
            println!(
                "{} ({}), academic year {}",
                summary.student_details.full_name,
                summary.student_details.admission_number,
                summary.academic_year
            );
            println!("  Fees due:  {:>12}", summary.total_fees_due.to_string());
            println!("  Paid:      {:>12}", summary.total_amount_paid.to_string());
            println!("  Pending:   {:>12}", summary.pending_fees.to_string());
        }
        Command::History { start, end } => {
            let start = parse_date("Start date", &start)?;
            let end = parse_date("End date", &end)?;
            let session = store.load()?;
            let records = client.transaction_history(&session, start, end).await?;

            if records.is_empty() {
                println!("No transactions between {start} and {end}");
            }

            for record in records {
                println!(
                    "{:>6}  {}  {:<17}  {:>12}  {:<20}  {}",
                    record.transaction_id,
                    record.transaction_date,
                    record.transaction_type.as_str(),
                    record.amount.to_string(),
                    record.description.unwrap_or_default(),
                    record.recorded_by
                );
            }
        }
        Command::AddUser {
            username,
            full_name,
            role,
        } => {
            let password = prompt_password("New user's password: ")?;
            let session = store.load()?;
            let user = client
                .sign_up(
                    &session,
                    &SignUpRequest {
                        username,
                        password,
                        full_name,
                        role,
                    },
                )
                .await?;
            println!(
                "Created {} \"{}\" with ID {}",
                user.role.as_str(),
                user.username,
                user.user_id
            );
        }
    }

    Ok(())
}

fn prompt_password(prompt: &str) -> Result<String, ClientError> {
    rpassword::prompt_password(prompt).map_err(|error: io::Error| {
        ClientError::InvalidInput(format!("Could not read password: {error}"))
    })
}
