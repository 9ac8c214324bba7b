//! # Leads Common Library
//!
//! Shared code for the lead-management service:
//! - Error and result types
//! - Configuration resolution (CLI → ENV → TOML → compiled default)
//! - Database initialization and schema
//! - Persisted models (leads, import reports, import errors)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
