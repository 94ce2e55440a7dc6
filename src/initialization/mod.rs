//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources the
//! pipeline needs up front:
//! - the logger (plain or JSON format)
//! - the DNS resolver used for reverse lookups

mod logger;
mod resolver;

// Re-export public API
pub use logger::init_logger_with;
pub use resolver::init_resolver;
