//! Events fired by the native payment session, and the updates that answer them.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::proto::payment::{Payment, PaymentMethod};
use crate::proto::request::{LineItem, PaymentContact, ShippingMethod};
use crate::proto::status::StatusCode;

/// A lifecycle callback from the native session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// `onvalidatemerchant`
    #[serde(rename_all = "camelCase")]
    ValidateMerchant {
        #[serde(rename = "validationURL")]
        validation_url: String,
    },
    /// `onpaymentmethodselected`
    #[serde(rename_all = "camelCase")]
    PaymentMethodSelected { payment_method: PaymentMethod },
    /// `onshippingcontactselected`; the contact is redacted until authorization.
    #[serde(rename_all = "camelCase")]
    ShippingContactSelected { shipping_contact: PaymentContact },
    /// `onshippingmethodselected`
    #[serde(rename_all = "camelCase")]
    ShippingMethodSelected { shipping_method: ShippingMethod },
    /// `onpaymentauthorized`
    PaymentAuthorized { payment: Payment },
    /// `oncancel`
    Cancel,
}

impl SessionEvent {
    /// Name of the native callback that delivers this event.
    pub fn callback_name(&self) -> &'static str {
        match self {
            SessionEvent::ValidateMerchant { .. } => "onvalidatemerchant",
            SessionEvent::PaymentMethodSelected { .. } => "onpaymentmethodselected",
            SessionEvent::ShippingContactSelected { .. } => "onshippingcontactselected",
            SessionEvent::ShippingMethodSelected { .. } => "onshippingmethodselected",
            SessionEvent::PaymentAuthorized { .. } => "onpaymentauthorized",
            SessionEvent::Cancel => "oncancel",
        }
    }
}

/// New total and line items after a payment method selection.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodUpdate {
    pub new_total: LineItem,
    pub new_line_items: Option<Vec<LineItem>>,
}

/// Answer to a shipping contact selection.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingContactUpdate {
    pub status: StatusCode,
    pub new_shipping_methods: Vec<ShippingMethod>,
    pub new_total: LineItem,
    pub new_line_items: Option<Vec<LineItem>>,
}

/// Answer to a shipping method selection.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethodUpdate {
    pub status: StatusCode,
    pub new_total: LineItem,
    pub new_line_items: Option<Vec<LineItem>>,
}
