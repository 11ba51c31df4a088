//! Data models: amounts, items, reports and configuration.

pub mod amount;
pub mod config;
pub mod item;
pub mod report;
