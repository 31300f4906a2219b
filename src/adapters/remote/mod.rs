//! Remote signing service adapter.
//!
//! Connects to the HTTP service that generates credentials, signs data and
//! verifies detached signatures.

pub mod client;
pub mod protocol;
