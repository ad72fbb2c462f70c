pub mod config;

pub use config::{Config, RunMode, ScraperConfig};
