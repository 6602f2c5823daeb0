use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle of a ticket. Stored as lowercase text, constrained by a
/// CHECK in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TicketStatus {
    Waiting,
    Serving,
    Done,
}

impl TicketStatus {
    /// Legal transitions: waiting -> serving -> done.
    pub fn can_advance_to(self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Waiting, TicketStatus::Serving)
                | (TicketStatus::Serving, TicketStatus::Done)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Waiting => "waiting",
            TicketStatus::Serving => "serving",
            TicketStatus::Done => "done",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(TicketStatus::Waiting),
            "serving" => Ok(TicketStatus::Serving),
            "done" => Ok(TicketStatus::Done),
            other => Err(Error::Validation(format!(
                "unknown status '{other}', expected waiting, serving or done"
            ))),
        }
    }
}

/// Staff role. Admins additionally see the performance report in the UI;
/// the server draws no permission boundary beyond that (non-goal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum StaffRole {
    Staff,
    Admin,
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StaffRole::Staff => "staff",
            StaffRole::Admin => "admin",
        })
    }
}

impl FromStr for StaffRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(StaffRole::Staff),
            "admin" => Ok(StaffRole::Admin),
            other => Err(Error::Validation(format!(
                "unknown role '{other}', expected staff or admin"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub name: String,
    pub queue_number: i64,
    pub status: TicketStatus,
    pub created_at: i64,
    pub served_by: Option<i64>,
    pub served_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// PHC-format PBKDF2 hash; never serialized outward.
    #[serde(skip_serializing)]
    pub password_phc: String,
    pub role: StaffRole,
    pub created_at: i64,
}

/// One row of the staff-performance report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StaffPerformance {
    pub staff_id: i64,
    pub staff_name: String,
    pub role: StaffRole,
    pub total_served: i64,
    pub served_today: i64,
    pub served_this_week: i64,
    pub avg_serve_minutes: Option<f64>,
}
