//! # festrec Common Library
//!
//! Shared code for the festrec workspace:
//! - Error and result types
//! - Configuration file and database path resolution
//! - SQLite pool initialization and schema

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};
