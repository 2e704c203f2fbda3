//! Core trait for the payment gateway backing the Apple Pay component.
//!
//! [`ApplePay`](crate::ApplePay) never talks HTTP itself. It asks a [`Gateway`]
//! for the merchant configuration, for merchant sessions and for nonces.
//! [`GatewayClient`](crate::gateway_client::GatewayClient) is the HTTP implementation.

use std::fmt::{Debug, Display};
use std::sync::Arc;

use applepay_types::config::GatewayConfiguration;
use applepay_types::proto::ValidationPayload;
use applepay_types::proto::gateway::{MerchantSessionRequest, TokenizeRequest, TokenizeResponse};

/// Errors reported by a [`Gateway`].
pub trait GatewayError: std::error::Error + Debug + Display + Send + Sync + 'static {
    /// `true` when the gateway answered and refused the request,
    /// `false` when the request never got a usable answer, including
    /// outages and rate limiting reported by the gateway.
    fn is_rejection(&self) -> bool;
}

/// Asynchronous interface to the payment gateway.
pub trait Gateway {
    /// The error type returned by this gateway.
    type Error: GatewayError;

    /// Fetches the client configuration of the merchant account.
    fn configuration(
        &self,
    ) -> impl Future<Output = Result<GatewayConfiguration, Self::Error>> + Send;

    /// Asks the gateway to open an Apple Pay merchant session.
    ///
    /// The returned payload is opaque and goes straight to the native session.
    fn create_merchant_session(
        &self,
        request: &MerchantSessionRequest,
    ) -> impl Future<Output = Result<ValidationPayload, Self::Error>> + Send;

    /// Exchanges an Apple Pay payment token for a gateway nonce.
    fn tokenize_apple_payment_token(
        &self,
        request: &TokenizeRequest,
    ) -> impl Future<Output = Result<TokenizeResponse, Self::Error>> + Send;
}

impl<T: Gateway> Gateway for Arc<T> {
    type Error = T::Error;

    fn configuration(
        &self,
    ) -> impl Future<Output = Result<GatewayConfiguration, Self::Error>> + Send {
        self.as_ref().configuration()
    }

    fn create_merchant_session(
        &self,
        request: &MerchantSessionRequest,
    ) -> impl Future<Output = Result<ValidationPayload, Self::Error>> + Send {
        self.as_ref().create_merchant_session(request)
    }

    fn tokenize_apple_payment_token(
        &self,
        request: &TokenizeRequest,
    ) -> impl Future<Output = Result<TokenizeResponse, Self::Error>> + Send {
        self.as_ref().tokenize_apple_payment_token(request)
    }
}
