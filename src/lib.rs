//! Metadata tooling for beamline data management.
//!
//! [`schema`] turns the master metadata workbook into per-site JSON schema
//! documents; [`catalog`] stores free-text metadata next to a relational
//! catalog of dataset files and searches it.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod schema;
pub mod workbook;

pub use error::{Error, Result};
