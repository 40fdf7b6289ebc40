mod app;
mod cli;
mod config;
mod effects;
mod mapping;
mod render;

pub use app::run_app;
