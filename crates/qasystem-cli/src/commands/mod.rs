//! CLI command handlers

pub mod ask;
pub mod config;
pub mod index;
pub mod serve;
