//! Protocol types for Apple Pay on the Web.
//!
//! # Key Types
//!
//! - [`PaymentRequest`] / [`PartialPaymentRequest`] - What the payment sheet shows
//! - [`LineItem`] - A total or line item, optionally recurring or deferred
//! - [`StatusCode`] - Completion status returned to the native session
//! - [`SessionEvent`] - Lifecycle callbacks from the native session
//! - [`TokenizedPayload`] - The gateway nonce produced by tokenization
//! - [`ValidationPayload`] - Opaque merchant session from merchant validation
//!
//! # Wire Format
//!
//! All types serialize to JSON using camelCase field names.

pub mod event;
pub mod gateway;
pub mod payload;
pub mod payment;
pub mod request;
pub mod status;

pub use event::*;
pub use payload::*;
pub use payment::*;
pub use request::*;
pub use status::*;
