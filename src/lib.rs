pub mod cli;
pub mod db;
pub mod error;
pub mod models;
pub mod queue;
pub mod reports;
pub mod server;
pub mod staff;
