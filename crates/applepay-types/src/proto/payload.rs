//! Results returned by the gateway: merchant sessions and tokenized payloads.

use serde::{Deserialize, Serialize};

/// Tri-state classification flag from the card's BIN data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinFlag {
    Yes,
    No,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BinFlag {
    /// `Some(true)` / `Some(false)` when known.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            BinFlag::Yes => Some(true),
            BinFlag::No => Some(false),
            BinFlag::Unknown => None,
        }
    }
}

/// Metadata about the card's issuing bank identification number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BinData {
    pub commercial: BinFlag,
    pub country_of_issuance: String,
    pub debit: BinFlag,
    pub durbin_regulated: BinFlag,
    pub healthcare: BinFlag,
    /// The gateway reports this one as a yes/no/unknown flag, not a bank name.
    pub issuing_bank: BinFlag,
    pub payroll: BinFlag,
    pub prepaid: BinFlag,
    pub product_id: String,
}

/// Card details attached to a tokenized Apple Pay payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardDetails {
    pub card_type: String,
    pub cardholder_name: String,
    /// Last two digits of the device account number.
    pub dpan_last_two: String,
}

/// A gateway payment method nonce for an Apple Pay payment.
///
/// Send it to the merchant server; it is single use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizedPayload {
    pub nonce: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub consumed: bool,
    #[serde(default)]
    pub details: CardDetails,
    #[serde(default)]
    pub bin_data: BinData,
}

/// Opaque merchant session returned by merchant validation.
///
/// Hand it unchanged to the native session's `completeMerchantValidation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationPayload(pub serde_json::Value);

impl ValidationPayload {
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}
