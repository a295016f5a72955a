//! Support code for the `screen` binary.

pub mod config;
pub mod screening;

pub use config::{AppConfig, NotifyConfig, ScreeningConfig, DEFAULT_CONFIG_FILE};
pub use screening::{
    evaluate_events, extracted_name, log_progress, screen, ScreeningOptions, ScreeningOutcome,
};
