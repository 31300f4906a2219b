//! Adapter layer modules for external system integration.
//!
//! - HTTP transport to the remote signing service
//! - Saving artifacts to the local filesystem

pub mod download;
pub mod remote;
pub mod transport;
