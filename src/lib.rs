pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod highlight;
pub mod presets;
pub mod storage;
pub mod ui;

pub use app::AppState;
pub use catalog::Hunt;
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
