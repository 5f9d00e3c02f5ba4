use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use school_finance::{NewUser, PasswordHash, Role, count_users, create_user, initialize_db};

/// A utility for adding a user directly to the database, e.g. the first administrator.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. Created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// The name the user will log in with.
    #[arg(long, short)]
    username: String,

    /// The user's name as shown on transaction records.
    #[arg(long, short)]
    full_name: String,

    /// One of "Admin", "Teaching Staff" or "Non-Teaching Staff".
    #[arg(long, short, default_value = "Admin")]
    role: Role,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let username = args.username.trim();
    let full_name = args.full_name.trim();
    if username.is_empty() || full_name.is_empty() {
        print_error("Username and full name cannot be empty.");
        exit(1);
    }

    let conn = Connection::open(db_path)?;
    initialize_db(&conn)?;
    println!(
        "Adding {} \"{username}\" to {db_path:#?}, which has {} user(s)",
        args.role,
        count_users(&conn)?
    );

    let password_hash = match get_new_password_hash() {
        Some(password_hash) => password_hash,
        None => return Ok(()),
    };

    match create_user(
        NewUser {
            username: username.to_owned(),
            password_hash,
            full_name: full_name.to_owned(),
            role: args.role,
        },
        &conn,
    ) {
        Ok(user) => println!("Created user {} with ID {}", user.username, user.id),
        Err(error) => {
            print_error(error);
            exit(1);
        }
    }

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        None => {
            print_error("Database path must include a file extension (e.g., 'school.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            print_error("Database path must include a file extension (e.g., 'school.db').");
            exit(1);
        }
        _ => {}
    }
}

fn get_new_password_hash() -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = match rpassword::prompt_password("Enter a password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password.is_empty() {
            print_error("Password cannot be empty.");
            continue;
        }

        let second_password = match rpassword::prompt_password("Enter the same password again: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                return None;
            }
            Err(error) => {
                print_error(format!("Could not read password from stdin: {error}"));
                return None;
            }
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::from_raw_password(&first_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
                continue;
            }
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

/// From https://crates.io/crates/capitalize
fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
