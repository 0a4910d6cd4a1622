//! Connection handling for sqlchat.
//!
//! Turns connection parameters into an open database handle, and stages
//! SQLite files into scoped working copies before they are opened.

pub mod builder;
pub mod upload;

pub use builder::{build, into_connection_error};
pub use upload::{StagedDatabase, Upload};
