pub mod analyzers;
pub mod chart;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod table;
