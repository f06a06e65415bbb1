//! Issue insights library exports

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod services;
pub mod state;
pub mod tasks;
