//! Configuration for the `applepay-rs` command line tool.

use applepay_client::GatewayClient;
use applepay_client::gateway_client::GatewayClientError;
use applepay_types::config::{Authorization, LiteralOrEnv};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// CLI arguments for the Apple Pay tool.
#[derive(Parser, Debug)]
#[command(name = "applepay-rs")]
#[command(about = "Apple Pay on the Web against a payment gateway")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Merge a partial payment request (JSON file) with the merchant defaults
    PaymentRequest {
        /// Path to a JSON payment request, `total` is required
        partial: PathBuf,
    },
    /// Obtain a merchant session for `completeMerchantValidation`
    Validate {
        /// `validationURL` of the `validatemerchant` event
        #[arg(long)]
        validation_url: String,
        /// Merchant name shown on the payment sheet
        #[arg(long)]
        display_name: Option<String>,
        /// Overrides the merchant identifier from the gateway configuration
        #[arg(long)]
        merchant_identifier: Option<String>,
        /// Overrides `domain_name` from the configuration file
        #[arg(long)]
        domain_name: Option<String>,
    },
    /// Exchange an Apple Pay payment token (JSON file) for a gateway nonce
    Tokenize {
        /// Path to `event.payment.token` as JSON
        token: PathBuf,
    },
}

/// Tool configuration.
///
/// `gateway_url` and `authorization` accept `$VAR` or `${VAR}` to read the
/// value from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    gateway_url: LiteralOrEnv<Url>,
    #[serde(default)]
    authorization: Option<LiteralOrEnv<Authorization>>,
    #[serde(default = "config_defaults::default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    configuration_cache_ttl_secs: Option<u64>,
    #[serde(default)]
    domain_name: Option<String>,
}

pub mod config_defaults {
    use std::env;

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Returns the default timeout with fallback: $GATEWAY_TIMEOUT_SECS env var -> 30
    pub fn default_timeout_secs() -> u64 {
        env::var("GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("Invalid gateway url: {0}")]
    GatewayClient(#[from] GatewayClientError),
}

impl Config {
    pub fn gateway_url(&self) -> &Url {
        self.gateway_url.inner()
    }

    pub fn authorization(&self) -> Option<&Authorization> {
        self.authorization.as_ref().map(|a| a.inner())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn domain_name(&self) -> Option<&str> {
        self.domain_name.as_deref()
    }

    /// Load configuration from a JSON file.
    ///
    /// Values not present in the file are resolved via environment variables
    /// or defaults during deserialization.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Builds the gateway client described by this configuration.
    pub fn gateway_client(&self) -> Result<GatewayClient, ConfigError> {
        let client = GatewayClient::try_from(self.gateway_url().as_str())?;
        let client = client.with_timeout(self.timeout());
        let client = match self.authorization() {
            Some(authorization) => client.with_authorization(authorization.clone()),
            None => client,
        };
        let client = match self.configuration_cache_ttl_secs {
            Some(ttl) => client.with_configuration_cache_ttl(Duration::from_secs(ttl)),
            None => client,
        };
        Ok(client)
    }
}
