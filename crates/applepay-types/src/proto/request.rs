//! Apple Pay payment request types.
//!
//! Field names follow Apple's `ApplePayPaymentRequest` dictionary. Dates are
//! carried as ISO 8601 strings and amounts as decimal strings; neither is
//! validated here, the native session does that.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::config::ApplePayWebConfiguration;

/// Whether a line item amount is final or still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineItemType {
    Final,
    Pending,
}

/// When a line item is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentTiming {
    Immediate,
    Recurring,
    Deferred,
    AutomaticReload,
}

/// Calendar unit of a recurring payment interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecurringPaymentDateUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

/// A line item shown on the payment sheet, including the total.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(rename = "type")]
    pub kind: Option<LineItemType>,
    pub label: String,
    /// Decimal string, e.g. `"19.99"`. Opaque to this crate.
    pub amount: String,
    pub payment_timing: Option<PaymentTiming>,
    pub recurring_payment_start_date: Option<String>,
    pub recurring_payment_interval_unit: Option<RecurringPaymentDateUnit>,
    pub recurring_payment_interval_count: Option<u32>,
    pub recurring_payment_end_date: Option<String>,
    pub deferred_payment_date: Option<String>,
    pub automatic_reload_payment_threshold_amount: Option<String>,
}

impl LineItem {
    /// A line item with only label and amount set.
    pub fn new(label: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            kind: None,
            label: label.into(),
            amount: amount.into(),
            payment_timing: None,
            recurring_payment_start_date: None,
            recurring_payment_interval_unit: None,
            recurring_payment_interval_count: None,
            recurring_payment_end_date: None,
            deferred_payment_date: None,
            automatic_reload_payment_threshold_amount: None,
        }
    }

    pub fn pending(mut self) -> Self {
        self.kind = Some(LineItemType::Pending);
        self
    }

    /// Marks the item as recurring every `count` `unit`s.
    pub fn recurring(mut self, unit: RecurringPaymentDateUnit, count: u32) -> Self {
        self.payment_timing = Some(PaymentTiming::Recurring);
        self.recurring_payment_interval_unit = Some(unit);
        self.recurring_payment_interval_count = Some(count);
        self
    }
}

/// Contact information, as supplied to or returned by the payment sheet.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentContact {
    pub phone_number: Option<String>,
    pub email_address: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub phonetic_given_name: Option<String>,
    pub phonetic_family_name: Option<String>,
    pub address_lines: Option<Vec<String>>,
    pub sub_locality: Option<String>,
    pub locality: Option<String>,
    pub postal_code: Option<String>,
    pub sub_administrative_area: Option<String>,
    pub administrative_area: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// A contact field the payment sheet must collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactField {
    PostalAddress,
    Phone,
    Email,
    Name,
    PhoneticName,
}

/// A selectable shipping option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub label: String,
    pub detail: String,
    pub amount: String,
    pub identifier: String,
}

/// How the items are delivered. Apple assumes `Shipping` when unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShippingType {
    #[default]
    Shipping,
    Delivery,
    StorePickup,
    ServicePickup,
}

/// A complete payment request, ready for the native session.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub total: LineItem,
    pub country_code: String,
    pub currency_code: String,
    pub supported_networks: Vec<String>,
    pub merchant_capabilities: Vec<String>,
    pub line_items: Option<Vec<LineItem>>,
    pub billing_contact: Option<PaymentContact>,
    pub shipping_contact: Option<PaymentContact>,
    pub shipping_methods: Option<Vec<ShippingMethod>>,
    pub shipping_type: Option<ShippingType>,
    pub required_billing_contact_fields: Option<Vec<ContactField>>,
    pub required_shipping_contact_fields: Option<Vec<ContactField>>,
    /// Newer Apple Pay keys this crate does not model. Passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A payment request where the merchant-defaulted fields may be missing.
///
/// Missing fields are filled by [`PartialPaymentRequest::merge`].
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialPaymentRequest {
    pub total: LineItem,
    pub country_code: Option<String>,
    pub currency_code: Option<String>,
    pub supported_networks: Option<Vec<String>>,
    pub merchant_capabilities: Option<Vec<String>>,
    pub line_items: Option<Vec<LineItem>>,
    pub billing_contact: Option<PaymentContact>,
    pub shipping_contact: Option<PaymentContact>,
    pub shipping_methods: Option<Vec<ShippingMethod>>,
    pub shipping_type: Option<ShippingType>,
    pub required_billing_contact_fields: Option<Vec<ContactField>>,
    pub required_shipping_contact_fields: Option<Vec<ContactField>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Values for the four fields a merge may fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequestDefaults {
    pub country_code: String,
    pub currency_code: String,
    pub merchant_capabilities: Vec<String>,
    pub supported_networks: Vec<String>,
}

impl From<&ApplePayWebConfiguration> for PaymentRequestDefaults {
    fn from(config: &ApplePayWebConfiguration) -> Self {
        Self {
            country_code: config.country_code.clone(),
            currency_code: config.currency_code.clone(),
            merchant_capabilities: config.merchant_capabilities(),
            supported_networks: config.supported_networks(),
        }
    }
}

impl PartialPaymentRequest {
    pub fn new(total: LineItem) -> Self {
        Self {
            total,
            country_code: None,
            currency_code: None,
            supported_networks: None,
            merchant_capabilities: None,
            line_items: None,
            billing_contact: None,
            shipping_contact: None,
            shipping_methods: None,
            shipping_type: None,
            required_billing_contact_fields: None,
            required_shipping_contact_fields: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Fills every missing defaulted field from `defaults`.
    ///
    /// Fields already set are kept as they are, even when empty.
    pub fn merge(self, defaults: PaymentRequestDefaults) -> PaymentRequest {
        PaymentRequest {
            total: self.total,
            country_code: self.country_code.unwrap_or(defaults.country_code),
            currency_code: self.currency_code.unwrap_or(defaults.currency_code),
            supported_networks: self
                .supported_networks
                .unwrap_or(defaults.supported_networks),
            merchant_capabilities: self
                .merchant_capabilities
                .unwrap_or(defaults.merchant_capabilities),
            line_items: self.line_items,
            billing_contact: self.billing_contact,
            shipping_contact: self.shipping_contact,
            shipping_methods: self.shipping_methods,
            shipping_type: self.shipping_type,
            required_billing_contact_fields: self.required_billing_contact_fields,
            required_shipping_contact_fields: self.required_shipping_contact_fields,
            extra: self.extra,
        }
    }
}

impl From<PaymentRequest> for PartialPaymentRequest {
    fn from(request: PaymentRequest) -> Self {
        Self {
            total: request.total,
            country_code: Some(request.country_code),
            currency_code: Some(request.currency_code),
            supported_networks: Some(request.supported_networks),
            merchant_capabilities: Some(request.merchant_capabilities),
            line_items: request.line_items,
            billing_contact: request.billing_contact,
            shipping_contact: request.shipping_contact,
            shipping_methods: request.shipping_methods,
            shipping_type: request.shipping_type,
            required_billing_contact_fields: request.required_billing_contact_fields,
            required_shipping_contact_fields: request.required_shipping_contact_fields,
            extra: request.extra,
        }
    }
}
