//! Payment data produced by the payment sheet.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::proto::request::PaymentContact;

/// Kind of card the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethodType {
    Debit,
    Credit,
    Prepaid,
    Store,
    EMoney,
    #[serde(other)]
    Unknown,
}

/// The card the user picked, as described by the payment sheet.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub display_name: Option<String>,
    pub network: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<PaymentMethodType>,
    pub billing_contact: Option<PaymentContact>,
}

/// One-time payment token from the native session.
///
/// `payment_data` is the encrypted blob; it is never inspected here.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentToken {
    #[serde(default)]
    pub payment_data: Option<serde_json::Value>,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_identifier: Option<String>,
}

impl PaymentToken {
    /// `true` when the token carries non-null payment data.
    pub fn has_payment_data(&self) -> bool {
        matches!(&self.payment_data, Some(data) if !data.is_null())
    }
}

/// The authorized payment delivered with the `paymentauthorized` event.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub token: PaymentToken,
    pub billing_contact: Option<PaymentContact>,
    pub shipping_contact: Option<PaymentContact>,
}
