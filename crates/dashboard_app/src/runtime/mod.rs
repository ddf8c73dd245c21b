//! Wiring between the pure core, the engine and the outside world.
pub mod app;
pub mod config;
pub mod effects;
pub mod render;

pub use app::run_app;
