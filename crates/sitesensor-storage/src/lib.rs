//! Storage layer for sitesensor
//!
//! This crate provides:
//! - A SQLite host state store (devices, state variables, action log)
//! - Schema setup on open

pub mod db;
pub mod error;

pub use db::{StateEntry, Storage};
pub use error::{Result, StorageError};
