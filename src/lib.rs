pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod settings;
pub mod state;
pub mod telemetry;
