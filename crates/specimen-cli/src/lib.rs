pub mod config;
pub mod errors;

pub use config::{load_schema, load_settings};
pub use errors::CliError;
