//! Request and response envelopes for the gateway's Apple Pay endpoints.
//!
//! - `POST ./apple_pay_web/sessions` with [`MerchantSessionRequest`]
//! - `POST ./payment_methods/apple_payment_tokens` with [`TokenizeRequest`],
//!   answered by [`TokenizeResponse`]

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::proto::payload::TokenizedPayload;
use crate::proto::payment::PaymentToken;
use crate::util::Base64Bytes;

/// Analytics metadata attached to every gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub source: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            source: "apple-pay".to_string(),
        }
    }
}

/// The `applePayWebSession` object sent for merchant validation.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplePayWebSession {
    pub validation_url: String,
    pub domain_name: Option<String>,
    pub merchant_identifier: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantSessionRequest {
    #[serde(rename = "_meta")]
    pub meta: Meta,
    pub apple_pay_web_session: ApplePayWebSession,
}

/// A payment token as the gateway wants it: `paymentData` base64-encoded.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplePaymentToken {
    pub payment_data: Base64Bytes<'static>,
    pub payment_method: Option<crate::proto::payment::PaymentMethod>,
    pub transaction_identifier: Option<String>,
}

impl ApplePaymentToken {
    /// Encodes the token's payment data. `None` when the token has none.
    pub fn try_from_token(token: &PaymentToken) -> Option<Result<Self, serde_json::Error>> {
        let payment_data = token.payment_data.as_ref().filter(|d| !d.is_null())?;
        Some(Base64Bytes::encode_json(payment_data).map(|payment_data| Self {
            payment_data,
            payment_method: token.payment_method.clone(),
            transaction_identifier: token.transaction_identifier.clone(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeRequest {
    #[serde(rename = "_meta")]
    pub meta: Meta,
    pub apple_payment_token: ApplePaymentToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeResponse {
    #[serde(default)]
    pub apple_pay_cards: Vec<TokenizedPayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merchant_session_request_shape() {
        let request = MerchantSessionRequest {
            meta: Meta::default(),
            apple_pay_web_session: ApplePayWebSession {
                validation_url: "https://apple-pay-gateway.apple.com/paymentservices/startSession"
                    .into(),
                domain_name: Some("shop.example".into()),
                merchant_identifier: "merchant.com.example".into(),
                display_name: None,
            },
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "_meta": {"source": "apple-pay"},
                "applePayWebSession": {
                    "validationUrl": "https://apple-pay-gateway.apple.com/paymentservices/startSession",
                    "domainName": "shop.example",
                    "merchantIdentifier": "merchant.com.example"
                }
            })
        );
    }

    #[test]
    fn test_token_without_payment_data() {
        let token: PaymentToken =
            serde_json::from_value(json!({"transactionIdentifier": "abc"})).unwrap();
        assert!(ApplePaymentToken::try_from_token(&token).is_none());
        let token: PaymentToken = serde_json::from_value(json!({"paymentData": null})).unwrap();
        assert!(ApplePaymentToken::try_from_token(&token).is_none());
    }

    #[test]
    fn test_payment_data_is_base64_json() {
        let token: PaymentToken = serde_json::from_value(json!({
            "paymentData": {"version": "EC_v1", "data": "xyz"},
            "paymentMethod": {"displayName": "Visa 1111", "network": "Visa", "type": "debit"},
            "transactionIdentifier": "tx-1"
        }))
        .unwrap();
        let encoded = ApplePaymentToken::try_from_token(&token).unwrap().unwrap();
        let data: serde_json::Value = encoded.payment_data.decode_json().unwrap();
        assert_eq!(data, json!({"version": "EC_v1", "data": "xyz"}));
        let wire = serde_json::to_value(&encoded).unwrap();
        assert!(wire["paymentData"].is_string());
        assert_eq!(wire["paymentMethod"]["type"], "debit");
    }
}
