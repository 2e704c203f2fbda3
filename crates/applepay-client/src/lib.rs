//! Apple Pay on the Web, backed by a payment gateway.
//!
//! The crate turns a merchant's gateway configuration into everything the
//! native Apple Pay session needs:
//!
//! - [`ApplePay::create_payment_request`] fills in the merchant defaults
//! - [`ApplePay::perform_validation`] obtains the opaque merchant session
//! - [`ApplePay::tokenize`] exchanges the payment token for a single-use nonce
//!
//! [`session::SessionDriver`] wires those to a native [`session::PaymentSession`].
//! HTTP access goes through the [`Gateway`] trait, implemented by
//! [`gateway_client::GatewayClient`].
//!
//! ## Feature flags
//!
//! - `telemetry`: emits `tracing` spans and events for gateway requests and
//!   component operations.

pub mod apple_pay;
pub mod error;
pub mod gateway;
pub mod gateway_client;
pub mod session;

pub use apple_pay::{ApplePay, TokenizeOptions, ValidationOptions};
pub use error::{ApplePayError, ErrorKind};
pub use gateway::{Gateway, GatewayError};
pub use gateway_client::GatewayClient;
