pub mod api;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod ws;
mod main_lib;

pub use main_lib::{build_state, init_tracing, AppState};
