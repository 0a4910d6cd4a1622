//! sqlchat - chat with your SQL database.
//!
//! Connect to a SQLite file or a MySQL server and ask questions in natural
//! language. An LLM agent with a small SQL toolkit decides which queries to
//! run and answers from the results.
//!
//! This library exposes the core modules for the binary and for integration tests.

pub mod agent;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod session;
pub mod tui;
