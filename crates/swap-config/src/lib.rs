//! TOML configuration with environment variable substitution.
//!
//! Secrets (API key, wallet private key) are referenced as `${VAR}` in the
//! file and resolved from the environment at load time, so the file itself
//! never needs to contain them. They are also never echoed in errors or
//! logs.

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::Path;
use swap_approval::ApprovalPolicy;
use swap_types::ChainId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("file not found: {0}")]
	FileNotFound(String),

	#[error("parse error: {0}")]
	ParseError(String),

	#[error("validation error: {0}")]
	ValidationError(String),

	#[error("environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("io error: {0}")]
	IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
	#[serde(default = "default_log_level")]
	pub log_level: String,
	pub aggregator: AggregatorConfig,
	pub wallet: WalletConfig,
	#[serde(default)]
	pub approval: ApprovalConfig,
	#[serde(default)]
	pub swap: SwapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
	/// Base URL of the aggregator API, without the version path.
	pub base_url: String,
	pub api_key: String,
	#[serde(default = "default_submit_timeout_secs")]
	pub submit_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
	/// Hex private key, normally supplied as `${SWAP_PRIVATE_KEY}`.
	pub private_key: String,
	/// Chain the wallet starts on.
	pub default_chain: ChainId,
	pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
	pub chain_id: ChainId,
	pub url: String,
}

impl WalletConfig {
	pub fn endpoint_map(&self) -> HashMap<ChainId, String> {
		self.endpoints
			.iter()
			.map(|e| (e.chain_id, e.url.clone()))
			.collect()
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
	pub policy: ApprovalPolicy,
	pub receipt_timeout_secs: u64,
}

impl Default for ApprovalConfig {
	fn default() -> Self {
		Self {
			policy: ApprovalPolicy::default(),
			receipt_timeout_secs: 180,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
	/// Seconds between fill-readiness polls.
	pub poll_interval_secs: u64,
	/// Seconds to monitor for fills before giving up.
	pub monitoring_timeout_secs: u64,
	/// Quiet period applied to amount-only quote parameter changes.
	pub quote_debounce_ms: u64,
}

impl Default for SwapConfig {
	fn default() -> Self {
		Self {
			poll_interval_secs: 5,
			monitoring_timeout_secs: 30 * 60,
			quote_debounce_ms: 1000,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_submit_timeout_secs() -> u64 {
	30
}

/// Configuration loader with environment variable substitution.
#[derive(Default)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "SWAP_".to_string(),
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

	pub async fn load(&self) -> Result<AppConfig, ConfigError> {
		let mut config = if let Some(file_path) = &self.file_path {
			self.load_from_file(file_path).await?
		} else {
			return Err(ConfigError::FileNotFound(
				"no configuration file specified".to_string(),
			));
		};

		self.apply_env_overrides(&mut config);
		validate(&config)?;

		Ok(config)
	}

	async fn load_from_file(&self, file_path: &str) -> Result<AppConfig, ConfigError> {
		let content = tokio::fs::read_to_string(file_path).await?;
		let substituted = substitute_env_vars(&content)?;
		toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))
	}

	fn apply_env_overrides(&self, config: &mut AppConfig) {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.log_level = log_level;
		}
		if let Ok(api_key) = env::var(format!("{}API_KEY", self.env_prefix)) {
			config.aggregator.api_key = api_key;
		}
	}
}

/// Replaces `${VAR}` patterns with the corresponding environment variables.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let mut result = content.to_string();
	let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
	if config.aggregator.base_url.is_empty() {
		return Err(ConfigError::ValidationError(
			"aggregator.base_url must not be empty".to_string(),
		));
	}
	if config.wallet.private_key.is_empty() {
		return Err(ConfigError::ValidationError(
			"wallet.private_key must not be empty".to_string(),
		));
	}
	if config.wallet.endpoints.is_empty() {
		return Err(ConfigError::ValidationError(
			"at least one wallet endpoint must be configured".to_string(),
		));
	}

	let map = config.wallet.endpoint_map();
	if map.len() != config.wallet.endpoints.len() {
		return Err(ConfigError::ValidationError(
			"duplicate chain_id in wallet endpoints".to_string(),
		));
	}
	if !map.contains_key(&config.wallet.default_chain) {
		return Err(ConfigError::ValidationError(format!(
			"no endpoint configured for default chain {}",
			config.wallet.default_chain
		)));
	}
	if config.swap.poll_interval_secs == 0 {
		return Err(ConfigError::ValidationError(
			"swap.poll_interval_secs must be at least 1".to_string(),
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn base_toml() -> &'static str {
		r#"
			log_level = "debug"

			[aggregator]
			base_url = "https://api.example.com"
			api_key = "key-123"

			[wallet]
			private_key = "0xabc"
			default_chain = 137

			[[wallet.endpoints]]
			chain_id = 137
			url = "https://polygon.example.com"

			[[wallet.endpoints]]
			chain_id = 8453
			url = "https://base.example.com"

			[approval]
			policy = "unlimited"
		"#
	}

	#[test]
	fn parses_full_config_with_defaults() {
		let config: AppConfig = toml::from_str(base_toml()).unwrap();
		assert_eq!(config.log_level, "debug");
		assert_eq!(config.aggregator.submit_timeout_secs, 30);
		assert_eq!(config.approval.policy, ApprovalPolicy::Unlimited);
		assert_eq!(config.approval.receipt_timeout_secs, 180);
		assert_eq!(config.swap.poll_interval_secs, 5);
		assert_eq!(config.swap.quote_debounce_ms, 1000);
		assert_eq!(config.wallet.endpoint_map().len(), 2);
		assert!(validate(&config).is_ok());
	}

	#[test]
	fn substitutes_environment_variables() {
		env::set_var("SWAP_CONFIG_TEST_KEY", "secret-value");
		let substituted =
			substitute_env_vars("api_key = \"${SWAP_CONFIG_TEST_KEY}\"").unwrap();
		assert_eq!(substituted, "api_key = \"secret-value\"");
		env::remove_var("SWAP_CONFIG_TEST_KEY");
	}

	#[test]
	fn missing_environment_variable_is_an_error() {
		let result = substitute_env_vars("key = \"${SWAP_CONFIG_TEST_UNSET}\"");
		assert!(matches!(result, Err(ConfigError::EnvVarNotFound(name)) if name == "SWAP_CONFIG_TEST_UNSET"));
	}

	#[test]
	fn rejects_default_chain_without_endpoint() {
		let mut config: AppConfig = toml::from_str(base_toml()).unwrap();
		config.wallet.default_chain = 1;
		assert!(matches!(
			validate(&config),
			Err(ConfigError::ValidationError(_))
		));
	}

	#[test]
	fn rejects_duplicate_endpoints() {
		let mut config: AppConfig = toml::from_str(base_toml()).unwrap();
		config.wallet.endpoints.push(EndpointConfig {
			chain_id: 137,
			url: "https://other.example.com".into(),
		});
		assert!(matches!(
			validate(&config),
			Err(ConfigError::ValidationError(_))
		));
	}

	#[test]
	fn rejects_empty_private_key() {
		let mut config: AppConfig = toml::from_str(base_toml()).unwrap();
		config.wallet.private_key.clear();
		assert!(matches!(
			validate(&config),
			Err(ConfigError::ValidationError(_))
		));
	}
}
