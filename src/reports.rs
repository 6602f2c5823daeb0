use clap::Subcommand;

/// Report-related CLI subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Per-staff serving performance over a date range
    Staff {
        /// Range start, YYYY-MM-DD (default: today)
        #[arg(long)]
        start: Option<String>,
        /// Range end, YYYY-MM-DD inclusive (default: today)
        #[arg(long)]
        end: Option<String>,
    },
}

use crate::db;
use crate::error::{Error, Result};
use crate::models::StaffPerformance;
use crate::queue::{self, Config};
use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::SqlitePool;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Aggregate staff performance over `[start, end]` (UTC dates, inclusive,
/// defaulting to today): tickets served in range, today, over the last
/// seven days, and the average waiting-to-served minutes.
pub async fn staff_performance(
    pool: &SqlitePool,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<StaffPerformance>> {
    let today = Utc::now().date_naive();
    let start = match start {
        Some(s) => parse_date(s)?,
        None => today,
    };
    let end = match end {
        Some(s) => parse_date(s)?,
        None => today,
    };
    if end < start {
        return Err(Error::Validation(format!(
            "range end {end} is before start {start}"
        )));
    }
    let today_start = day_start_ms(today);
    let rows = db::staff_performance(
        pool,
        day_start_ms(start),
        day_start_ms(end) + DAY_MS,
        today_start,
        today_start - 7 * DAY_MS,
    )
    .await?;
    Ok(rows)
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("invalid date '{s}', expected YYYY-MM-DD")))
}

fn day_start_ms(d: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))
        .timestamp_millis()
}

/// Execute a report command
pub async fn run_report_command(cmd: ReportCommands) -> anyhow::Result<()> {
    let pool = queue::init_pool(&Config::default()).await?;

    match cmd {
        ReportCommands::Staff { start, end } => {
            let rows = staff_performance(&pool, start.as_deref(), end.as_deref())
                .await
                .context("Error building staff performance report")?;
            if rows.is_empty() {
                println!("No staff found");
            } else {
                println!(
                    "{:<5} {:<20} {:<8} {:<8} {:<8} {:<8} {:<10}",
                    "ID", "NAME", "ROLE", "TOTAL", "TODAY", "WEEK", "AVG_MIN"
                );
                for r in rows {
                    let avg = r
                        .avg_serve_minutes
                        .map(|m| format!("{m:.1}"))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<5} {:<20} {:<8} {:<8} {:<8} {:<8} {:<10}",
                        r.staff_id,
                        r.staff_name,
                        r.role.to_string(),
                        r.total_served,
                        r.served_today,
                        r.served_this_week,
                        avg
                    );
                }
            }
        }
    }
    Ok(())
}
