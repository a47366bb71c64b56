//! Utility functions and data structures.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory, config and query history

pub mod app_data;

pub use app_data::*;
