pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod service;
pub mod types;

pub use config::Config;
pub use error::GateError;
pub use service::initializer::Initializer;
pub use service::launcher::Launcher;
