//! CLI command implementations.

pub mod accounts;
pub mod config;
pub mod demo;
pub mod instruments;
pub mod portfolio;
pub mod trade;
