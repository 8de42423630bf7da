// broadcast-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error("Config loading error: {0}")]
	Config(#[from] broadcast_config::ConfigError),
}
