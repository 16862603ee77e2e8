pub mod app_config;
pub mod cli;
pub mod error;
pub mod output;
pub mod startup;
