//! Arroyo Engine - headless driver for Arroyo boards.
//!
//! Loads configuration, generates and populates a board, and runs the turn
//! loop with structured logging.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod session;

pub use config::EngineConfig;
pub use session::{Session, SessionSummary};
