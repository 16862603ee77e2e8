#![allow(clippy::too_many_arguments)]

pub mod clients;
pub mod commands;
pub mod connection_settings;
pub mod consumer;
pub mod coordination;
pub mod error;
pub mod filter;
pub mod models;
pub mod queries;
pub mod snapshot;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod utils;
