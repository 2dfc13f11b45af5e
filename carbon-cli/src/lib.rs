pub mod app;
pub mod config;
pub mod input;
pub mod logging;
pub mod render;
