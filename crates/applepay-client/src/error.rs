//! Errors surfaced by the Apple Pay component.

use std::fmt;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Who is expected to fix the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Integration or merchant account configuration.
    Merchant,
    /// Communication with the gateway.
    Network,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Merchant => "MERCHANT",
            ErrorKind::Network => "NETWORK",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplePayError {
    #[error("Apple Pay is not enabled for this merchant account")]
    ApplePayNotEnabled,
    #[error("Gateway client error: {context}: {source}")]
    Client {
        context: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("A validation URL is required to perform merchant validation")]
    ValidationUrlRequired,
    #[error("Merchant validation was rejected by the gateway: {source}")]
    MerchantValidationFailed {
        #[source]
        source: BoxError,
    },
    #[error("A network error occurred during merchant validation: {source}")]
    MerchantValidationNetwork {
        #[source]
        source: BoxError,
    },
    #[error("A payment token with payment data is required to tokenize")]
    PaymentTokenRequired,
    #[error("Failed to tokenize Apple Pay payment: {context}")]
    Tokenization {
        context: &'static str,
        #[source]
        source: Option<BoxError>,
    },
}

impl ApplePayError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApplePayError::ApplePayNotEnabled => "APPLE_PAY_NOT_ENABLED",
            ApplePayError::Client { .. } => "APPLE_PAY_CLIENT_ERROR",
            ApplePayError::ValidationUrlRequired => "APPLE_PAY_VALIDATION_URL_REQUIRED",
            ApplePayError::MerchantValidationFailed { .. } => "APPLE_PAY_MERCHANT_VALIDATION_FAILED",
            ApplePayError::MerchantValidationNetwork { .. } => {
                "APPLE_PAY_MERCHANT_VALIDATION_NETWORK"
            }
            ApplePayError::PaymentTokenRequired => "APPLE_PAY_PAYMENT_TOKEN_REQUIRED",
            ApplePayError::Tokenization { .. } => "APPLE_PAY_TOKENIZATION",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplePayError::ApplePayNotEnabled
            | ApplePayError::ValidationUrlRequired
            | ApplePayError::MerchantValidationFailed { .. }
            | ApplePayError::PaymentTokenRequired => ErrorKind::Merchant,
            ApplePayError::Client { .. }
            | ApplePayError::MerchantValidationNetwork { .. }
            | ApplePayError::Tokenization { .. } => ErrorKind::Network,
        }
    }

    /// Raised while creating the component.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApplePayError::ApplePayNotEnabled | ApplePayError::Client { .. }
        )
    }

    /// Raised by merchant validation.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ApplePayError::ValidationUrlRequired
                | ApplePayError::MerchantValidationFailed { .. }
                | ApplePayError::MerchantValidationNetwork { .. }
        )
    }

    /// Raised by tokenization.
    pub fn is_tokenization_error(&self) -> bool {
        matches!(
            self,
            ApplePayError::PaymentTokenRequired | ApplePayError::Tokenization { .. }
        )
    }
}
