//! # riposte
//!
//! Application layer for Riposte: CLI commands, HTTP API and file I/O over
//! `riposte-core`.

pub mod api;
pub mod cli;
pub mod config;
