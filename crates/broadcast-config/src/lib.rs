// broadcast-config/src/lib.rs

use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "BROADCAST_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<BroadcastConfig, ConfigError> {
		let Some(file_path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};

		info!("Loading broadcast configuration from {}", file_path);
		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.clone()))
			}
			Err(e) => return Err(e.into()),
		};

		self.load_from_str(&content)
	}

	/// Parses configuration text, then applies substitution, overrides and validation.
	pub fn load_from_str(&self, content: &str) -> Result<BroadcastConfig, ConfigError> {
		let substituted_content = self.substitute_env_vars(content)?;

		let mut config: BroadcastConfig = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut BroadcastConfig) -> Result<(), ConfigError> {
		if let Ok(value) = env::var(format!("{}ENABLE_FALLBACK", self.env_prefix)) {
			debug!("Overriding enable_fallback from environment");
			config.broadcast.enable_fallback = value.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid enable_fallback: {}", e))
			})?;
		}

		if let Ok(value) = env::var(format!("{}APPROVAL_TIMEOUT_SECS", self.env_prefix)) {
			debug!("Overriding approval timeout from environment");
			config.remote_signer.approval_timeout_secs = value.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid approval timeout: {}", e))
			})?;
		}

		if let Ok(value) = env::var(format!("{}INVALIDATION_GRACE_MS", self.env_prefix)) {
			debug!("Overriding invalidation grace from environment");
			config.effects.invalidation_grace_ms = value.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid invalidation grace: {}", e))
			})?;
		}

		Ok(())
	}
}

/// Checks cross-field constraints that serde cannot express.
pub fn validate_config(config: &BroadcastConfig) -> Result<(), ConfigError> {
	if config.broadcast.enable_fallback && config.broadcast.chain.is_empty() {
		return Err(ConfigError::ValidationError(
			"Provider chain must not be empty when fallback is enabled".to_string(),
		));
	}

	let mut seen = HashSet::new();
	for method in &config.broadcast.chain {
		if !seen.insert(method) {
			return Err(ConfigError::ValidationError(format!(
				"Provider {} listed more than once",
				method
			)));
		}
	}

	if config.remote_signer.approval_timeout_secs == 0 {
		return Err(ConfigError::ValidationError(
			"Approval timeout must be greater than zero".to_string(),
		));
	}

	if config.local_key.transaction_expiration_secs == 0 {
		return Err(ConfigError::ValidationError(
			"Transaction expiration must be greater than zero".to_string(),
		));
	}

	Ok(())
}
