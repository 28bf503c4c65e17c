pub mod api;
pub mod config;
pub mod core;
pub mod format;
pub mod interactive;
