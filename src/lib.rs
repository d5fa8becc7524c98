//! Library crate entry point.
//! The console binary in src/main.rs and the integration tests build on it.

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod session;
