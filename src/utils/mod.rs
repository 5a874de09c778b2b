//! Utility modules shared across the server.

pub mod date;
pub mod exec;
pub mod mime;
pub mod url;
