use crate::queue::{self, TicketCommands};
use crate::reports::{self, ReportCommands};
use crate::server;
use crate::staff::{self, StaffCommands};
use clap::{Parser, Subcommand};

/// Waitline CLI interface
#[derive(Parser, Debug)]
#[command(name = "waitline", about = "Walk-in queue ticketing service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8888)]
        port: u16,
    },
    /// Ticket commands
    #[command(subcommand)]
    Ticket(TicketCommands),
    /// Staff management commands
    #[command(subcommand)]
    Staff(StaffCommands),
    /// Reporting commands
    #[command(subcommand)]
    Report(ReportCommands),
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Serve { port } => server::run_server(port).await,
            Commands::Ticket(cmd) => queue::run_ticket_command(cmd).await,
            Commands::Staff(cmd) => staff::run_staff_command(cmd).await,
            Commands::Report(cmd) => reports::run_report_command(cmd).await,
        }
    }
}
