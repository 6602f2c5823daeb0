use crate::models::{Staff, StaffPerformance, StaffRole, Ticket, TicketStatus};
use anyhow::Context;
use sqlx::{SqlitePool, migrate::Migrator};
use std::{fs, path::Path};

// Embed migrations from the `migrations` directory
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the database file if missing; with `force_recreate`, start from
/// a fresh file. Migrations run when the pool is opened.
pub async fn create_db_if_needed_at(path: &Path, force_recreate: bool) -> anyhow::Result<()> {
    if force_recreate && path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove DB file at {}", path.display()))?;
    }
    if !path.exists() {
        fs::File::create(path)
            .with_context(|| format!("Failed to create DB file at {}", path.display()))?;
    }
    Ok(())
}

/// Open the SQLite pool at the given path and bring the schema up to date.
pub async fn init_pool_at(path: &Path) -> anyhow::Result<SqlitePool> {
    let db_url = format!("sqlite://{}", path.to_string_lossy());
    let pool = SqlitePool::connect(&db_url)
        .await
        .context("Failed to connect to the database")?;
    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(pool)
}

// ---- tickets ----

/// Insert a new waiting ticket, allocating the next queue number in the
/// same statement. The UNIQUE constraint on queue_number backs this up.
pub async fn issue_ticket(pool: &SqlitePool, name: &str, now_ms: i64) -> sqlx::Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO ticket (name, queue_number, status, created_at)
         SELECT ?, COALESCE(MAX(queue_number), 0) + 1, 'waiting', ? FROM ticket",
    )
    .bind(name)
    .bind(now_ms)
    .execute(pool)
    .await?;
    Ok(rec.last_insert_rowid())
}

pub async fn get_ticket_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Ticket>> {
    sqlx::query_as::<_, Ticket>(
        "SELECT id, name, queue_number, status, created_at, served_by, served_at
         FROM ticket WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_ticket_by_number(pool: &SqlitePool, number: i64) -> sqlx::Result<Option<Ticket>> {
    sqlx::query_as::<_, Ticket>(
        "SELECT id, name, queue_number, status, created_at, served_by, served_at
         FROM ticket WHERE queue_number = ?",
    )
    .bind(number)
    .fetch_optional(pool)
    .await
}

/// List tickets in queue order, optionally restricted to one status.
pub async fn list_tickets(
    pool: &SqlitePool,
    status: Option<TicketStatus>,
) -> sqlx::Result<Vec<Ticket>> {
    match status {
        Some(s) => {
            sqlx::query_as::<_, Ticket>(
                "SELECT id, name, queue_number, status, created_at, served_by, served_at
                 FROM ticket WHERE status = ? ORDER BY queue_number",
            )
            .bind(s)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Ticket>(
                "SELECT id, name, queue_number, status, created_at, served_by, served_at
                 FROM ticket ORDER BY queue_number",
            )
            .fetch_all(pool)
            .await
        }
    }
}

/// Case-insensitive substring search on customer name, newest first.
pub async fn search_tickets(pool: &SqlitePool, name: &str) -> sqlx::Result<Vec<Ticket>> {
    let pattern = format!("%{name}%");
    sqlx::query_as::<_, Ticket>(
        "SELECT id, name, queue_number, status, created_at, served_by, served_at
         FROM ticket
         WHERE LOWER(name) LIKE LOWER(?)
         ORDER BY created_at DESC",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
}

/// Move a waiting ticket to serving. Fails the partial unique index when
/// another ticket is already serving.
pub async fn mark_serving(
    pool: &SqlitePool,
    number: i64,
    staff_id: Option<i64>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        "UPDATE ticket
         SET status = 'serving', served_by = COALESCE(?, served_by)
         WHERE queue_number = ? AND status = 'waiting'",
    )
    .bind(staff_id)
    .bind(number)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

/// Finish a serving ticket, stamping served_at and (when given) served_by.
pub async fn mark_done(
    pool: &SqlitePool,
    number: i64,
    staff_id: Option<i64>,
    now_ms: i64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        "UPDATE ticket
         SET status = 'done', served_by = COALESCE(?, served_by), served_at = ?
         WHERE queue_number = ? AND status = 'serving'",
    )
    .bind(staff_id)
    .bind(now_ms)
    .bind(number)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

/// Promote the lowest-numbered waiting ticket to serving.
pub async fn promote_next_waiting(pool: &SqlitePool, staff_id: Option<i64>) -> sqlx::Result<u64> {
    let res = sqlx::query(
        "UPDATE ticket
         SET status = 'serving', served_by = COALESCE(?, served_by)
         WHERE id = (SELECT id FROM ticket WHERE status = 'waiting' ORDER BY queue_number LIMIT 1)",
    )
    .bind(staff_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

/// Fetch the ticket currently being served, if any. The partial unique
/// index guarantees at most one row.
pub async fn get_serving_ticket(pool: &SqlitePool) -> sqlx::Result<Option<Ticket>> {
    sqlx::query_as::<_, Ticket>(
        "SELECT id, name, queue_number, status, created_at, served_by, served_at
         FROM ticket WHERE status = 'serving'",
    )
    .fetch_optional(pool)
    .await
}

/// Delete all done tickets, returning how many rows were removed.
pub async fn purge_done_tickets(pool: &SqlitePool) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM ticket WHERE status = 'done'")
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// ---- staff ----

pub async fn create_staff(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_phc: &str,
    role: StaffRole,
    now_ms: i64,
) -> sqlx::Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO staff (name, email, password_phc, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(password_phc)
    .bind(role)
    .bind(now_ms)
    .execute(pool)
    .await?;
    Ok(rec.last_insert_rowid())
}

pub async fn get_staff_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Staff>> {
    sqlx::query_as::<_, Staff>(
        "SELECT id, name, email, password_phc, role, created_at FROM staff WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_staff_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<Staff>> {
    sqlx::query_as::<_, Staff>(
        "SELECT id, name, email, password_phc, role, created_at FROM staff WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// List all staff, newest first.
pub async fn list_staff(pool: &SqlitePool) -> sqlx::Result<Vec<Staff>> {
    sqlx::query_as::<_, Staff>(
        "SELECT id, name, email, password_phc, role, created_at
         FROM staff ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await
}

/// Delete a staff member by id, returning how many rows were affected.
/// Tickets they served keep their history (served_by is nulled by the FK).
pub async fn delete_staff_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM staff WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

// ---- reports ----

/// Per-staff aggregates over done tickets. The LEFT JOIN keeps staff with
/// nothing served; the date range scopes total and average, while the
/// today/week counters stay anchored to now.
pub async fn staff_performance(
    pool: &SqlitePool,
    range_start_ms: i64,
    range_end_ms: i64,
    today_start_ms: i64,
    week_start_ms: i64,
) -> sqlx::Result<Vec<StaffPerformance>> {
    sqlx::query_as::<_, StaffPerformance>(
        "SELECT s.id AS staff_id,
                s.name AS staff_name,
                s.role AS role,
                COALESCE(SUM(CASE WHEN t.served_at >= ? AND t.served_at < ? THEN 1 ELSE 0 END), 0)
                    AS total_served,
                COALESCE(SUM(CASE WHEN t.served_at >= ? THEN 1 ELSE 0 END), 0) AS served_today,
                COALESCE(SUM(CASE WHEN t.served_at >= ? THEN 1 ELSE 0 END), 0) AS served_this_week,
                AVG(CASE WHEN t.served_at >= ? AND t.served_at < ?
                         THEN (t.served_at - t.created_at) / 60000.0 END) AS avg_serve_minutes
         FROM staff s
         LEFT JOIN ticket t
             ON t.served_by = s.id
            AND t.status = 'done'
            AND t.served_at IS NOT NULL
         GROUP BY s.id, s.name, s.role
         ORDER BY total_served DESC, s.id",
    )
    .bind(range_start_ms)
    .bind(range_end_ms)
    .bind(today_start_ms)
    .bind(week_start_ms)
    .bind(range_start_ms)
    .bind(range_end_ms)
    .fetch_all(pool)
    .await
}
