pub mod backend;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod export;
pub mod models;
pub mod server;
pub mod store;
