use clap::Subcommand;

/// Ticket-related CLI subcommands
#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// Issue a ticket for a customer and print the assigned number
    Issue {
        /// Customer name
        name: String,
    },
    /// List tickets in queue order
    List {
        /// Restrict to one status (waiting, serving, done)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a single ticket by queue number
    Show {
        /// Queue number
        number: i64,
    },
    /// Search tickets by customer name (case-insensitive substring)
    Search {
        /// Name fragment
        name: String,
    },
    /// Advance a ticket (waiting -> serving, serving -> done)
    Status {
        /// Queue number
        number: i64,
        /// Target status
        status: String,
        /// Acting staff id, recorded on the ticket
        #[arg(long)]
        staff_id: Option<i64>,
    },
    /// Call the next waiting ticket to the counter
    Next {
        /// Acting staff id, recorded on the ticket
        #[arg(long)]
        staff_id: Option<i64>,
    },
    /// Delete all done tickets
    PurgeDone,
}

use crate::db;
use crate::error::{Error, Result};
use crate::models::{Ticket, TicketStatus};
use anyhow::Context;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Configuration for database setup
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub force_recreate: bool,
}

impl Default for Config {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { db_path: cwd.join("waitline.db"), force_recreate: false }
    }
}

/// Initialize the pool, ensuring the database exists first.
pub async fn init_pool(cfg: &Config) -> anyhow::Result<SqlitePool> {
    db::create_db_if_needed_at(&cfg.db_path, cfg.force_recreate).await?;
    let pool = db::init_pool_at(&cfg.db_path).await?;
    Ok(pool)
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_ms() -> Result<i64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Internal(e.to_string()))?;
    Ok(now.as_millis() as i64)
}

// A unique violation on the serving path means the partial index on
// status = 'serving' rejected a second serving ticket.
fn serving_conflict(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict("another ticket is already being served".to_string())
        }
        _ => Error::Db(e),
    }
}

/// Issue a ticket: allocate the next queue number and insert a waiting row.
pub async fn issue_ticket(pool: &SqlitePool, name: &str) -> Result<Ticket> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("customer name is required".to_string()));
    }
    let id = db::issue_ticket(pool, name, now_ms()?).await?;
    db::get_ticket_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("ticket not found after issue".to_string()))
}

/// List tickets in queue order, optionally filtered by status.
pub async fn list_tickets(pool: &SqlitePool, status: Option<TicketStatus>) -> Result<Vec<Ticket>> {
    Ok(db::list_tickets(pool, status).await?)
}

/// Fetch a ticket by queue number.
pub async fn get_ticket(pool: &SqlitePool, number: i64) -> Result<Ticket> {
    db::get_ticket_by_number(pool, number)
        .await?
        .ok_or_else(|| Error::NotFound(format!("ticket {number} not found")))
}

/// Search tickets by customer name.
pub async fn search_tickets(pool: &SqlitePool, name: &str) -> Result<Vec<Ticket>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("name parameter is required".to_string()));
    }
    Ok(db::search_tickets(pool, name).await?)
}

/// Advance a ticket along waiting -> serving -> done. Moving to done
/// stamps served_at; a given staff_id is recorded on the ticket either way.
pub async fn set_status(
    pool: &SqlitePool,
    number: i64,
    next: TicketStatus,
    staff_id: Option<i64>,
) -> Result<Ticket> {
    let current = get_ticket(pool, number).await?;
    if !current.status.can_advance_to(next) {
        return Err(Error::Conflict(format!(
            "cannot move ticket {number} from {} to {next}",
            current.status
        )));
    }
    if let Some(id) = staff_id {
        ensure_staff_exists(pool, id).await?;
    }
    let affected = match next {
        TicketStatus::Serving => db::mark_serving(pool, number, staff_id)
            .await
            .map_err(serving_conflict)?,
        TicketStatus::Done => db::mark_done(pool, number, staff_id, now_ms()?).await?,
        // can_advance_to never admits waiting as a target
        TicketStatus::Waiting => 0,
    };
    if affected == 0 {
        return Err(Error::Conflict(format!(
            "ticket {number} changed state concurrently"
        )));
    }
    get_ticket(pool, number).await
}

/// Promote the lowest-numbered waiting ticket to serving. Returns `None`
/// when nobody is waiting.
pub async fn call_next(pool: &SqlitePool, staff_id: Option<i64>) -> Result<Option<Ticket>> {
    if let Some(id) = staff_id {
        ensure_staff_exists(pool, id).await?;
    }
    let promoted = db::promote_next_waiting(pool, staff_id)
        .await
        .map_err(serving_conflict)?;
    if promoted == 0 {
        return Ok(None);
    }
    let ticket = db::get_serving_ticket(pool)
        .await?
        .ok_or_else(|| Error::Internal("serving ticket not found after call-next".to_string()))?;
    Ok(Some(ticket))
}

/// Delete all done tickets, returning the count removed.
pub async fn purge_done(pool: &SqlitePool) -> Result<u64> {
    Ok(db::purge_done_tickets(pool).await?)
}

async fn ensure_staff_exists(pool: &SqlitePool, id: i64) -> Result<()> {
    db::get_staff_by_id(pool, id)
        .await?
        .map(|_| ())
        .ok_or_else(|| Error::NotFound(format!("staff {id} not found")))
}

/// Format an epoch-ms timestamp for console output.
pub(crate) fn fmt_ts(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

/// Execute a ticket command
pub async fn run_ticket_command(cmd: TicketCommands) -> anyhow::Result<()> {
    let pool = init_pool(&Config::default()).await?;

    match cmd {
        TicketCommands::Issue { name } => {
            let t = issue_ticket(&pool, &name)
                .await
                .context("Error issuing ticket")?;
            println!("Issued ticket #{} for '{}'", t.queue_number, t.name);
        }
        TicketCommands::List { status } => {
            let status: Option<TicketStatus> = status.as_deref().map(str::parse).transpose()?;
            let tickets = list_tickets(&pool, status)
                .await
                .context("Error listing tickets")?;
            if tickets.is_empty() {
                println!("No tickets found");
            } else {
                println!("{:<8} {:<20} {:<10} {:<20}", "NUMBER", "NAME", "STATUS", "CREATED");
                for t in tickets {
                    println!(
                        "{:<8} {:<20} {:<10} {:<20}",
                        t.queue_number,
                        t.name,
                        t.status.as_str(),
                        fmt_ts(t.created_at)
                    );
                }
            }
        }
        TicketCommands::Show { number } => {
            let t = get_ticket(&pool, number)
                .await
                .context("Error fetching ticket")?;
            println!("Ticket #{} ({})", t.queue_number, t.name);
            println!("  status: {}", t.status);
            println!("  created: {}", fmt_ts(t.created_at));
            if let Some(at) = t.served_at {
                println!("  served: {}", fmt_ts(at));
            }
            if let Some(by) = t.served_by {
                println!("  served_by: staff {by}");
            }
        }
        TicketCommands::Search { name } => {
            let tickets = search_tickets(&pool, &name)
                .await
                .context("Error searching tickets")?;
            if tickets.is_empty() {
                println!("No tickets matching '{name}'");
            } else {
                for t in tickets {
                    println!("#{} {} [{}]", t.queue_number, t.name, t.status);
                }
            }
        }
        TicketCommands::Status { number, status, staff_id } => {
            let status: TicketStatus = status.parse()?;
            let t = set_status(&pool, number, status, staff_id)
                .await
                .context("Error updating ticket status")?;
            println!("Ticket #{} is now {}", t.queue_number, t.status);
        }
        TicketCommands::Next { staff_id } => {
            match call_next(&pool, staff_id).await.context("Error calling next ticket")? {
                Some(t) => println!("Now serving #{} ({})", t.queue_number, t.name),
                None => println!("No waiting tickets"),
            }
        }
        TicketCommands::PurgeDone => {
            let deleted = purge_done(&pool).await.context("Error purging tickets")?;
            println!("Purged {deleted} done ticket(s)");
        }
    }
    Ok(())
}
