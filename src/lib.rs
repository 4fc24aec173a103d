//! cdfgen - concurrent discrete-distribution number generator
//!
//! Draws values from a user-supplied cumulative distribution table and keeps
//! a bounded, thread-safe history of recent draws together with live
//! per-value frequencies.
//!
//! # Architecture
//!
//! - **Distribution**: validated CDF tables and inverse-transform sampling
//! - **History**: fixed-capacity FIFO with incrementally maintained counts
//! - **Generator**: ties a table to a history and reports percentages
//! - **Workers**: generator and persistence threads sharing one generator
//! - **Output**: file persistence of the newest entry, text/JSON summaries

pub mod config;
pub mod diagnostics;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod history;
pub mod logging;
pub mod output;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use distribution::CdfTable;
pub use generator::NumberGenerator;
pub use history::BoundedHistory;
pub use worker::ConcurrentRunner;

/// Result type used at the application boundary
pub type Result<T> = anyhow::Result<T>;
