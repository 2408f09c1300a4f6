//! CLI commands

pub mod catalog;
pub mod check_config;
pub mod serve;
