//! # Mitti Common Library
//!
//! Shared code for the Mitti soil-scan crates:
//! - Error type used by storage and configuration code
//! - Root folder and TOML configuration resolution
//! - SQLite initialisation and table creation

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
