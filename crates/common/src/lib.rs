//! Shared building blocks for the auth workspace: logging setup, small
//! response types and the admin HTTP listener.

pub mod types;
pub mod utils;
pub mod admin_http;
