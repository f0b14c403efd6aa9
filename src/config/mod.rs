//! Configuration management
//!
//! Connection parameters from the form and user settings from disk.

pub mod connections;
pub mod settings;

pub use connections::{ConnectionParameters, SslMode};
pub use settings::Settings;
