use crate::error::Error;
use crate::models::{Staff, StaffPerformance, StaffRole, Ticket, TicketStatus};
use crate::queue::Config as QueueConfig;
use crate::{queue, reports, staff};
use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;
use tokio::signal;

/// Run the HTTP server on the given port
pub async fn run_server(port: u16) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Initialize database pool (ensures DB exists and schema is ready)
    let pool = queue::init_pool(&QueueConfig::default()).await?;

    // Build router with ticket/staff/report routes and shared state
    let app = app_router(pool.clone());

    // Allow overriding bind address via env (useful for Docker). Default 127.0.0.1
    let bind_ip = std::env::var("WAITLINE_BIND").unwrap_or_else(|_| "127.0.0.1".to_string());
    let ip: IpAddr = bind_ip
        .parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)));
    let addr = SocketAddr::from((ip, port));
    tracing::info!("Listening on {} - Use Ctrl+C to quit.", addr);
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {e}");
        anyhow!("Bind error: {e}")
    })?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {e}");
            anyhow!("Server error: {e}")
        })?;
    Ok(())
}

/// Construct the Axum `Router` for the service, injecting shared state.
pub fn app_router(pool: SqlitePool) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Ticket endpoints
        .route("/tickets", get(list_tickets).post(issue_ticket))
        .route("/tickets/search", get(search_tickets))
        .route("/tickets/next", post(call_next))
        .route("/tickets/done", delete(purge_done))
        .route("/tickets/{number}", get(show_ticket))
        .route("/tickets/{number}/status", put(update_status))
        // Staff endpoints
        .route("/staff", get(list_staff))
        .route("/staff/register", post(register_staff))
        .route("/staff/login", post(login_staff))
        .route("/staff/{id}", delete(remove_staff))
        // Reports
        .route("/reports/staff-performance", get(staff_performance))
        .with_state(pool)
}

// Request payload for issuing a ticket
#[derive(Deserialize)]
struct IssueBody {
    name: String,
}

// Query parameters for listing tickets
#[derive(Deserialize)]
struct ListParams {
    status: Option<TicketStatus>,
}

// Query parameters for the name search
#[derive(Deserialize)]
struct SearchParams {
    name: Option<String>,
}

// Request payload for a status transition
#[derive(Deserialize)]
struct StatusBody {
    status: TicketStatus,
    staff_id: Option<i64>,
}

// Query parameters for call-next
#[derive(Deserialize)]
struct NextParams {
    staff_id: Option<i64>,
}

// Request payload for staff registration
#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    role: Option<StaffRole>,
}

// Request payload for staff login
#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

// Query parameters for the performance report
#[derive(Deserialize)]
struct ReportParams {
    start: Option<String>,
    end: Option<String>,
}

// Issue a new ticket
async fn issue_ticket(
    State(pool): State<SqlitePool>,
    Json(body): Json<IssueBody>,
) -> Result<(StatusCode, Json<Ticket>), Error> {
    let ticket = queue::issue_ticket(&pool, &body.name).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

// List tickets in queue order, optionally filtered by status
async fn list_tickets(
    Query(params): Query<ListParams>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<Ticket>>, Error> {
    let tickets = queue::list_tickets(&pool, params.status).await?;
    Ok(Json(tickets))
}

// Search tickets by customer name
async fn search_tickets(
    Query(params): Query<SearchParams>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<Ticket>>, Error> {
    let name = params
        .name
        .ok_or_else(|| Error::Validation("name parameter is required".to_string()))?;
    let tickets = queue::search_tickets(&pool, &name).await?;
    Ok(Json(tickets))
}

// Fetch one ticket by queue number
async fn show_ticket(
    Path(number): Path<i64>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Ticket>, Error> {
    let ticket = queue::get_ticket(&pool, number).await?;
    Ok(Json(ticket))
}

// Advance a ticket's status
async fn update_status(
    Path(number): Path<i64>,
    State(pool): State<SqlitePool>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Ticket>, Error> {
    let ticket = queue::set_status(&pool, number, body.status, body.staff_id).await?;
    Ok(Json(ticket))
}

// Call the next waiting ticket to the counter
async fn call_next(
    Query(params): Query<NextParams>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Ticket>, Error> {
    match queue::call_next(&pool, params.staff_id).await? {
        Some(ticket) => Ok(Json(ticket)),
        None => Err(Error::NotFound("no waiting tickets".to_string())),
    }
}

// Delete all done tickets
async fn purge_done(
    State(pool): State<SqlitePool>,
) -> Result<Json<serde_json::Value>, Error> {
    let deleted = queue::purge_done(&pool).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

// List staff members (password hashes never serialize)
async fn list_staff(State(pool): State<SqlitePool>) -> Result<Json<Vec<Staff>>, Error> {
    let staff = staff::list_staff(&pool).await?;
    Ok(Json(staff))
}

// Register a staff member
async fn register_staff(
    State(pool): State<SqlitePool>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Staff>), Error> {
    let created =
        staff::register(&pool, &body.name, &body.email, &body.password, body.role).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// Verify staff credentials
async fn login_staff(
    State(pool): State<SqlitePool>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, Error> {
    let staff = staff::login(&pool, &body.email, &body.password).await?;
    Ok(Json(json!({ "message": "Login successful", "staff": staff })))
}

// Remove a staff member
async fn remove_staff(
    Path(id): Path<i64>,
    State(pool): State<SqlitePool>,
) -> Result<StatusCode, Error> {
    staff::remove_staff(&pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Per-staff performance aggregates
async fn staff_performance(
    Query(params): Query<ReportParams>,
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<StaffPerformance>>, Error> {
    let rows =
        reports::staff_performance(&pool, params.start.as_deref(), params.end.as_deref()).await?;
    Ok(Json(rows))
}
