//! The Apple Pay component: request builder, merchant validator and tokenizer.
//!
//! ```rust,no_run
//! use applepay_client::{ApplePay, ValidationOptions};
//! use applepay_client::gateway_client::GatewayClient;
//! use applepay_types::proto::{LineItem, PartialPaymentRequest};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = GatewayClient::try_from("https://gateway.example/client_api/v1")?;
//! let apple_pay = ApplePay::create(gateway).await?;
//!
//! let request = apple_pay.create_payment_request(PartialPaymentRequest::new(
//!     LineItem::new("My Company", "19.99"),
//! ));
//! // Hand `request` to the native session, then on `validatemerchant`:
//! let merchant_session = apple_pay
//!     .perform_validation(ValidationOptions::new("https://apple-pay-gateway.apple.com/paymentservices/startSession"))
//!     .await?;
//! # let _ = (request, merchant_session);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use applepay_types::config::ApplePayWebConfiguration;
use applepay_types::proto::gateway::{
    ApplePayWebSession, ApplePaymentToken, MerchantSessionRequest, Meta, TokenizeRequest,
};
use applepay_types::proto::{
    PartialPaymentRequest, PaymentRequest, PaymentRequestDefaults, PaymentToken,
    TokenizedPayload, ValidationPayload,
};
use tokio::task::JoinHandle;

use crate::error::ApplePayError;
use crate::gateway::{Gateway, GatewayError};

#[cfg(feature = "telemetry")]
use tracing::instrument;

/// Options for [`ApplePay::perform_validation`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// The `validationURL` from the `validatemerchant` event.
    pub validation_url: String,
    /// Canonical store name, at most 128 UTF-8 characters, not localized.
    pub display_name: Option<String>,
    /// Overrides the gateway-configured Apple merchant identifier.
    pub merchant_identifier: Option<String>,
    /// Overrides the component's domain name.
    pub domain_name: Option<String>,
}

impl ValidationOptions {
    pub fn new(validation_url: impl Into<String>) -> Self {
        Self {
            validation_url: validation_url.into(),
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_merchant_identifier(mut self, merchant_identifier: impl Into<String>) -> Self {
        self.merchant_identifier = Some(merchant_identifier.into());
        self
    }

    pub fn with_domain_name(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = Some(domain_name.into());
        self
    }
}

/// Options for [`ApplePay::tokenize`].
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeOptions {
    /// `event.payment.token` from the `paymentauthorized` event.
    pub token: PaymentToken,
}

/// Apple Pay on the Web, backed by a [`Gateway`].
///
/// Cheap to clone; clones share the gateway and the merchant configuration.
#[derive(Debug)]
pub struct ApplePay<G> {
    gateway: Arc<G>,
    configuration: Arc<ApplePayWebConfiguration>,
    domain_name: Option<String>,
}

impl<G> Clone for ApplePay<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            configuration: Arc::clone(&self.configuration),
            domain_name: self.domain_name.clone(),
        }
    }
}

impl<G> ApplePay<G>
where
    G: Gateway + Send + Sync + 'static,
{
    /// Creates the component from an authorized gateway.
    ///
    /// Fails with [`ApplePayError::ApplePayNotEnabled`] when the merchant account
    /// has no Apple Pay configuration.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "applepay.create", skip_all, err)
    )]
    pub async fn create(gateway: G) -> Result<Self, ApplePayError> {
        let configuration =
            gateway
                .configuration()
                .await
                .map_err(|e| ApplePayError::Client {
                    context: "Failed to fetch gateway configuration",
                    source: Box::new(e),
                })?;
        let apple_pay_web = configuration
            .apple_pay_web
            .ok_or(ApplePayError::ApplePayNotEnabled)?;
        Ok(Self::from_configuration(gateway, apple_pay_web))
    }

    /// Callback flavour of [`ApplePay::create`]. Requires a Tokio runtime.
    pub fn create_with_callback<F>(gateway: G, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Self, ApplePayError>) + Send + 'static,
    {
        tokio::spawn(async move { callback(Self::create(gateway).await) })
    }

    /// Creates the component from an already known merchant configuration.
    pub fn from_configuration(gateway: G, configuration: ApplePayWebConfiguration) -> Self {
        Self {
            gateway: Arc::new(gateway),
            configuration: Arc::new(configuration),
            domain_name: None,
        }
    }

    /// Domain name reported during merchant validation, unless overridden per call.
    pub fn with_domain_name(mut self, domain_name: impl Into<String>) -> Self {
        self.domain_name = Some(domain_name.into());
        self
    }

    /// The merchant id representing the merchant's association with the gateway.
    ///
    /// Needed for the native `canMakePaymentsWithActiveCard` check.
    pub fn merchant_identifier(&self) -> &str {
        &self.configuration.merchant_identifier
    }

    pub fn configuration(&self) -> &ApplePayWebConfiguration {
        &self.configuration
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Merges a payment request with the merchant defaults.
    ///
    /// `countryCode`, `currencyCode`, `merchantCapabilities` and
    /// `supportedNetworks` are filled in only when missing.
    pub fn create_payment_request(&self, partial: PartialPaymentRequest) -> PaymentRequest {
        partial.merge(PaymentRequestDefaults::from(self.configuration.as_ref()))
    }

    /// Obtains a merchant session for the native session's `completeMerchantValidation`.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "applepay.perform_validation", skip_all, err, fields(validation_url = %options.validation_url))
    )]
    pub async fn perform_validation(
        &self,
        options: ValidationOptions,
    ) -> Result<ValidationPayload, ApplePayError> {
        if options.validation_url.is_empty() {
            return Err(ApplePayError::ValidationUrlRequired);
        }
        let request = MerchantSessionRequest {
            meta: Meta::default(),
            apple_pay_web_session: ApplePayWebSession {
                validation_url: options.validation_url,
                domain_name: options.domain_name.or_else(|| self.domain_name.clone()),
                merchant_identifier: options
                    .merchant_identifier
                    .unwrap_or_else(|| self.configuration.merchant_identifier.clone()),
                display_name: options.display_name,
            },
        };
        self.gateway
            .create_merchant_session(&request)
            .await
            .map_err(|e| {
                if e.is_rejection() {
                    ApplePayError::MerchantValidationFailed {
                        source: Box::new(e),
                    }
                } else {
                    ApplePayError::MerchantValidationNetwork {
                        source: Box::new(e),
                    }
                }
            })
    }

    /// Callback flavour of [`ApplePay::perform_validation`]. Requires a Tokio runtime.
    pub fn perform_validation_with_callback<F>(
        &self,
        options: ValidationOptions,
        callback: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(Result<ValidationPayload, ApplePayError>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.perform_validation(options).await) })
    }

    /// Exchanges the native payment token for a gateway nonce.
    ///
    /// Nothing is retried. On error the caller should complete the native
    /// session with [`StatusCode::Failure`](applepay_types::proto::StatusCode::Failure).
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "applepay.tokenize", skip_all, err)
    )]
    pub async fn tokenize(
        &self,
        options: TokenizeOptions,
    ) -> Result<TokenizedPayload, ApplePayError> {
        let apple_payment_token = ApplePaymentToken::try_from_token(&options.token)
            .ok_or(ApplePayError::PaymentTokenRequired)?
            .map_err(|e| ApplePayError::Tokenization {
                context: "failed to encode payment data",
                source: Some(Box::new(e)),
            })?;
        let request = TokenizeRequest {
            meta: Meta::default(),
            apple_payment_token,
        };
        let response = self
            .gateway
            .tokenize_apple_payment_token(&request)
            .await
            .map_err(|e| ApplePayError::Tokenization {
                context: "gateway request failed",
                source: Some(Box::new(e)),
            })?;
        response
            .apple_pay_cards
            .into_iter()
            .next()
            .ok_or(ApplePayError::Tokenization {
                context: "gateway returned no Apple Pay card",
                source: None,
            })
    }

    /// Callback flavour of [`ApplePay::tokenize`]. Requires a Tokio runtime.
    pub fn tokenize_with_callback<F>(&self, options: TokenizeOptions, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<TokenizedPayload, ApplePayError>) + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move { callback(this.tokenize(options).await) })
    }
}
