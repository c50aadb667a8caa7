//! egonet command-line interface
//!
//! Loads every ego network of a data directory into the SurrealDB graph store
//! and the SQLite relational store, then times the same analytical questions
//! against both.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod output;
pub mod stores;
