//! CLI Commands

pub mod catalog;
pub mod compile;
pub mod config;
