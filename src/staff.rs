use clap::Subcommand;

/// Staff-related CLI subcommands
#[derive(Subcommand, Debug)]
pub enum StaffCommands {
    /// Register a staff member
    Register {
        /// Display name
        name: String,
        /// Login email (unique)
        email: String,
        /// Password (hashed before storage)
        password: String,
        /// Role: staff or admin (default: staff)
        #[arg(long, default_value = "staff")]
        role: String,
    },
    /// List staff members
    List,
    /// Remove a staff member
    Remove {
        /// Staff id
        id: i64,
    },
}

use crate::db;
use crate::error::{Error, Result};
use crate::models::{Staff, StaffRole};
use crate::queue::{self, Config, fmt_ts, now_ms};
use anyhow::Context;
use pbkdf2::Pbkdf2;
use pbkdf2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use sqlx::SqlitePool;

/// Register a new staff member. The password is stored as a PHC-format
/// PBKDF2 hash; duplicate emails are rejected.
pub async fn register(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password: &str,
    role: Option<StaffRole>,
) -> Result<Staff> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(Error::Validation(
            "name, email and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(Error::Validation(format!("invalid email address '{email}'")));
    }
    if db::get_staff_by_email(pool, email).await?.is_some() {
        return Err(Error::Conflict(
            "staff with this email already exists".to_string(),
        ));
    }
    let phc = hash_password(password)?;
    let role = role.unwrap_or(StaffRole::Staff);
    let id = db::create_staff(pool, name, email, &phc, role, now_ms()?)
        .await
        .map_err(email_conflict)?;
    db::get_staff_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("staff not found after registration".to_string()))
}

/// Verify credentials and return the staff row. The error is the same
/// whether the email is unknown or the password is wrong.
pub async fn login(pool: &SqlitePool, email: &str, password: &str) -> Result<Staff> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Error::Validation("email and password are required".to_string()));
    }
    let staff = db::get_staff_by_email(pool, email)
        .await?
        .ok_or(Error::InvalidCredentials)?;
    verify_password(password, &staff.password_phc)?;
    Ok(staff)
}

/// List all staff, newest first.
pub async fn list_staff(pool: &SqlitePool) -> Result<Vec<Staff>> {
    Ok(db::list_staff(pool).await?)
}

/// Remove a staff member by id.
pub async fn remove_staff(pool: &SqlitePool, id: i64) -> Result<()> {
    let deleted = db::delete_staff_by_id(pool, id).await?;
    if deleted == 0 {
        return Err(Error::NotFound(format!("staff {id} not found")));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, phc: &str) -> Result<()> {
    let parsed =
        PasswordHash::new(phc).map_err(|e| Error::Internal(format!("stored hash invalid: {e}")))?;
    Pbkdf2
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| Error::InvalidCredentials)
}

// Registration races on the UNIQUE(email) constraint past the pre-check.
fn email_conflict(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict("staff with this email already exists".to_string())
        }
        _ => Error::Db(e),
    }
}

/// Execute a staff command
pub async fn run_staff_command(cmd: StaffCommands) -> anyhow::Result<()> {
    let pool = queue::init_pool(&Config::default()).await?;

    match cmd {
        StaffCommands::Register { name, email, password, role } => {
            let role: StaffRole = role.parse()?;
            let s = register(&pool, &name, &email, &password, Some(role))
                .await
                .context("Error registering staff")?;
            println!("Registered {} <{}> with ID {} ({})", s.name, s.email, s.id, s.role);
        }
        StaffCommands::List => {
            let staff = list_staff(&pool).await.context("Error listing staff")?;
            if staff.is_empty() {
                println!("No staff found");
            } else {
                println!("{:<5} {:<20} {:<28} {:<8} {:<20}", "ID", "NAME", "EMAIL", "ROLE", "CREATED");
                for s in staff {
                    println!(
                        "{:<5} {:<20} {:<28} {:<8} {:<20}",
                        s.id,
                        s.name,
                        s.email,
                        s.role.to_string(),
                        fmt_ts(s.created_at)
                    );
                }
            }
        }
        StaffCommands::Remove { id } => match remove_staff(&pool, id).await {
            Ok(()) => println!("Removed staff {id}"),
            Err(Error::NotFound(_)) => {
                eprintln!("Staff {id} not found");
                std::process::exit(1);
            }
            Err(e) => return Err(e).context("Error removing staff"),
        },
    }
    Ok(())
}
