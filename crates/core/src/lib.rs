//! Domain types for the Casablanca avatar-generation client.
//!
//! Everything here is free of network access: request validation and
//! encoding, the configurable wire schema, status snapshot parsing,
//! metrics extraction, and the shared error taxonomy.

pub mod encoding;
pub mod error;
pub mod metrics;
pub mod request;
pub mod snapshot;
pub mod types;
pub mod wire;
