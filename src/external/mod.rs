//! Collaborators outside the waitlist engine: tee-time availability and the
//! shared outbound HTTP client.

pub mod client;
pub mod directory;

pub use directory::{Directory, OpenSlot, TeeTimeDirectory};
