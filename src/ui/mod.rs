//! ui
//!
//! User-facing output of the command-line tool.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display

pub mod output;
