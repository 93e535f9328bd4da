mod api;
pub mod args;
pub mod cache;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod report;
mod utils;


pub use api::{Mode, SummaryKind, SummaryQuery};
pub use config::Config;
pub use error::{Error, ErrorType, Result};
