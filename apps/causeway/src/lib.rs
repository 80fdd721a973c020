//! # Causeway
//!
//! Command-line front end for `causeway-core`: file I/O, layered
//! configuration and the `data`, `graph`, `knowledge` and `config`
//! commands.

pub mod cli;
pub mod config;
