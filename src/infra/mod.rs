//! Infrastructure layer for cross-cutting concerns.
//!
//! - Configuration management and validation
//! - Error handling and result types
//! - Progress reporting and user feedback

pub mod config;
pub mod error;
pub mod progress;
