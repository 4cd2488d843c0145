pub mod config;
pub mod error;
pub mod event;
pub mod level;
pub mod state;
