//! Completion status codes for the native payment session.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Outcome signalled back to the native session after each lifecycle step.
///
/// The integer values are defined by the native runtime and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    /// The requested action succeeded.
    Success = 0,
    /// The requested action failed.
    Failure = 1,
    /// The billing address is not valid.
    InvalidBillingPostalAddress = 2,
    /// The shipping address is not valid.
    InvalidShippingPostalAddress = 3,
    /// The shipping contact information is not valid.
    InvalidShippingContact = 4,
    /// A PIN is required. China Union Pay cards may require one.
    PinRequired = 5,
    /// The PIN is not valid.
    PinIncorrect = 6,
    /// Too many PIN attempts; the user is locked out.
    PinLockout = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unknown Apple Pay status code {0}")]
pub struct UnknownStatusCode(pub u8);

impl StatusCode {
    pub const ALL: [StatusCode; 8] = [
        StatusCode::Success,
        StatusCode::Failure,
        StatusCode::InvalidBillingPostalAddress,
        StatusCode::InvalidShippingPostalAddress,
        StatusCode::InvalidShippingContact,
        StatusCode::PinRequired,
        StatusCode::PinIncorrect,
        StatusCode::PinLockout,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The constant name used by the native runtime, e.g. `STATUS_SUCCESS`.
    pub fn constant_name(self) -> &'static str {
        match self {
            StatusCode::Success => "STATUS_SUCCESS",
            StatusCode::Failure => "STATUS_FAILURE",
            StatusCode::InvalidBillingPostalAddress => "STATUS_INVALID_BILLING_POSTAL_ADDRESS",
            StatusCode::InvalidShippingPostalAddress => "STATUS_INVALID_SHIPPING_POSTAL_ADDRESS",
            StatusCode::InvalidShippingContact => "STATUS_INVALID_SHIPPING_CONTACT",
            StatusCode::PinRequired => "STATUS_PIN_REQUIRED",
            StatusCode::PinIncorrect => "STATUS_PIN_INCORRECT",
            StatusCode::PinLockout => "STATUS_PIN_LOCKOUT",
        }
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }
}

impl From<StatusCode> for u8 {
    fn from(code: StatusCode) -> Self {
        code.as_u8()
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = UnknownStatusCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        StatusCode::ALL
            .get(value as usize)
            .copied()
            .ok_or(UnknownStatusCode(value))
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constant_name())
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for StatusCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let num = u8::deserialize(deserializer)?;
        StatusCode::try_from(num).map_err(serde::de::Error::custom)
    }
}
