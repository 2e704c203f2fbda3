//! Command execution for the `applepay-rs` tool.
//!
//! - Loads `.env` variables.
//! - Installs logging (and OpenTelemetry export when `OTEL_*` is set).
//! - Creates the Apple Pay component from the configured gateway.
//! - Runs one subcommand and prints its JSON result to stdout.

use applepay_client::{ApplePay, ApplePayError, Gateway, TokenizeOptions, ValidationOptions};
use applepay_types::proto::{PartialPaymentRequest, PaymentToken};
use clap::Parser;
use dotenvy::dotenv;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CliArgs, Command, Config, ConfigError};
use crate::telemetry::Telemetry;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to read {0}: {1}")]
    InputRead(PathBuf, std::io::Error),
    #[error("Failed to parse {0}: {1}")]
    InputParse(PathBuf, serde_json::Error),
    #[error("{}: {}", .0.code(), .0)]
    ApplePay(#[from] ApplePayError),
    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

pub async fn run() -> Result<(), RunError> {
    dotenv().ok();
    let cli_args = CliArgs::parse();
    let _telemetry = Telemetry::new();

    let config = Config::load_from_path(&cli_args.config)?;
    let gateway = config.gateway_client()?;
    tracing::info!(gateway_url = %config.gateway_url(), "Creating Apple Pay component");

    let apple_pay = ApplePay::create(gateway).await?;
    let apple_pay = match config.domain_name() {
        Some(domain_name) => apple_pay.with_domain_name(domain_name),
        None => apple_pay,
    };

    let output = execute(&apple_pay, cli_args.command)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Command failed"))?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Runs one subcommand against an already created component.
pub async fn execute<G>(
    apple_pay: &ApplePay<G>,
    command: Command,
) -> Result<serde_json::Value, RunError>
where
    G: Gateway + Send + Sync + 'static,
{
    match command {
        Command::PaymentRequest { partial } => {
            let partial: PartialPaymentRequest = read_json(&partial)?;
            let request = apple_pay.create_payment_request(partial);
            Ok(serde_json::to_value(request)?)
        }
        Command::Validate {
            validation_url,
            display_name,
            merchant_identifier,
            domain_name,
        } => {
            let options = ValidationOptions {
                validation_url,
                display_name,
                merchant_identifier,
                domain_name,
            };
            let merchant_session = apple_pay.perform_validation(options).await?;
            Ok(merchant_session.into_value())
        }
        Command::Tokenize { token } => {
            let token: PaymentToken = read_json(&token)?;
            let payload = apple_pay.tokenize(TokenizeOptions { token }).await?;
            Ok(serde_json::to_value(payload)?)
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, RunError> {
    let content =
        fs::read_to_string(path).map_err(|e| RunError::InputRead(path.to_path_buf(), e))?;
    serde_json::from_str(&content).map_err(|e| RunError::InputParse(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use applepay_client::GatewayClient;
    use serde_json::json;
    use tempfile::{TempDir, tempdir};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn apple_pay(server: &MockServer) -> ApplePay<GatewayClient> {
        Mock::given(method("GET"))
            .and(path("/configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "applePayWeb": {
                    "countryCode": "US",
                    "currencyCode": "USD",
                    "merchantIdentifier": "merchant.com.example",
                    "supportedNetworks": ["visa", "mastercard"]
                }
            })))
            .mount(server)
            .await;
        let gateway = GatewayClient::try_from(server.uri()).unwrap();
        ApplePay::create(gateway)
            .await
            .unwrap()
            .with_domain_name("shop.example")
    }

    /// Writes `value` to `<dir>/<name>.json`; removed with `dir`.
    fn write_input(dir: &TempDir, name: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.path().join(format!("{name}.json"));
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_payment_request_command() {
        let server = MockServer::start().await;
        let apple_pay = apple_pay(&server).await;
        let dir = tempdir().unwrap();
        let partial = write_input(
            &dir,
            "partial",
            json!({"total": {"label": "Co", "amount": "19.99"}}),
        );

        let output = execute(&apple_pay, Command::PaymentRequest { partial })
            .await
            .unwrap();
        assert_eq!(
            output,
            json!({
                "total": {"label": "Co", "amount": "19.99"},
                "countryCode": "US",
                "currencyCode": "USD",
                "merchantCapabilities": ["supports3DS"],
                "supportedNetworks": ["visa", "masterCard"]
            })
        );
    }

    #[tokio::test]
    async fn test_validate_command_uses_configured_domain() {
        let server = MockServer::start().await;
        let apple_pay = apple_pay(&server).await;
        Mock::given(method("POST"))
            .and(path("/apple_pay_web/sessions"))
            .and(body_partial_json(json!({
                "applePayWebSession": {
                    "domainName": "shop.example",
                    "merchantIdentifier": "merchant.com.example",
                    "displayName": "My Store"
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"merchantSessionIdentifier": "ms"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let output = execute(
            &apple_pay,
            Command::Validate {
                validation_url: "https://apple.example/startSession".into(),
                display_name: Some("My Store".into()),
                merchant_identifier: None,
                domain_name: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(output, json!({"merchantSessionIdentifier": "ms"}));
    }

    #[tokio::test]
    async fn test_tokenize_command_requires_payment_data() {
        let server = MockServer::start().await;
        let apple_pay = apple_pay(&server).await;
        let dir = tempdir().unwrap();
        let token = write_input(&dir, "token", json!({"transactionIdentifier": "tx"}));

        let err = execute(&apple_pay, Command::Tokenize { token })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::ApplePay(ApplePayError::PaymentTokenRequired)
        ));
        assert!(err.to_string().starts_with("APPLE_PAY_PAYMENT_TOKEN_REQUIRED: "));
    }

    #[test]
    fn test_input_files_are_removed_with_their_dir() {
        let dir = tempdir().unwrap();
        let path = write_input(&dir, "partial", json!({}));
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let server = MockServer::start().await;
        let apple_pay = apple_pay(&server).await;
        let partial = PathBuf::from("/nonexistent/applepay-rs/partial.json");

        let err = execute(&apple_pay, Command::PaymentRequest { partial })
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::InputRead(..)));
    }
}
