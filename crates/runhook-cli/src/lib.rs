//! # runhook-cli
//!
//! Command-line interface for runhook.
//!
//! ## Commands
//!
//! - `runhook serve`: Run the HTTP server
//! - `runhook init`: Create the configuration document if it is missing
//! - `runhook show`: Print the configuration document
//! - `runhook sync`: Pull the working copy once, as a webhook would
//! - `runhook doctor`: Report settings problems

pub mod commands;

pub use commands::Cli;
