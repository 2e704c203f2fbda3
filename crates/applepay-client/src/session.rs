//! Native Apple Pay session lifecycle.
//!
//! The payment sheet itself belongs to the host runtime. This module defines
//! the seam to that runtime ([`NativeRuntime`], [`PaymentSession`]), tracks
//! which callback is waiting for an answer ([`SessionLifecycle`]), and wires
//! the standard answers to [`ApplePay`] ([`SessionDriver`]):
//!
//! - `validatemerchant` → [`ApplePay::perform_validation`] → `completeMerchantValidation`,
//!   or `abort` on error
//! - `paymentauthorized` → [`ApplePay::tokenize`] → `completePayment(STATUS_SUCCESS)`,
//!   or `completePayment(STATUS_FAILURE)` on error
//!
//! Every callback must be answered before the runtime fires the next one.

use applepay_types::proto::{
    PaymentContact, PaymentMethod, PaymentMethodUpdate, PaymentRequest, SessionEvent,
    ShippingContactUpdate, ShippingMethod, ShippingMethodUpdate, StatusCode, TokenizedPayload,
    ValidationPayload,
};
use std::fmt;

use crate::apple_pay::{ApplePay, TokenizeOptions, ValidationOptions};
use crate::error::{ApplePayError, BoxError};
use crate::gateway::Gateway;

/// A native Apple Pay session.
///
/// Each `complete_*` method answers the matching [`SessionEvent`].
pub trait PaymentSession {
    fn begin(&mut self);

    fn abort(&mut self);

    fn complete_merchant_validation(&mut self, merchant_session: &ValidationPayload);

    fn complete_payment(&mut self, status: StatusCode);

    fn complete_payment_method_selection(&mut self, update: &PaymentMethodUpdate);

    fn complete_shipping_contact_selection(&mut self, update: &ShippingContactUpdate);

    fn complete_shipping_method_selection(&mut self, update: &ShippingMethodUpdate);
}

/// The host runtime that owns the payment sheet.
pub trait NativeRuntime {
    type Session: PaymentSession;
    type Error: std::error::Error + Send + Sync + 'static;

    fn supports_version(&self, version: u32) -> bool;

    fn can_make_payments(&self) -> bool;

    /// Whether the user has an active card provisioned for `merchant_identifier`.
    ///
    /// Pass [`ApplePay::merchant_identifier`].
    fn can_make_payments_with_active_card(&self, merchant_identifier: &str) -> bool;

    fn create_session(
        &self,
        version: u32,
        request: &PaymentRequest,
    ) -> Result<Self::Session, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Begun,
    MerchantValidated,
    Completed,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Aborted)
    }
}

/// A native callback waiting for its `complete_*` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    MerchantValidation,
    PaymentMethodSelection,
    ShippingContactSelection,
    ShippingMethodSelection,
    Payment,
}

impl fmt::Display for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Pending::MerchantValidation => "completeMerchantValidation",
            Pending::PaymentMethodSelection => "completePaymentMethodSelection",
            Pending::ShippingContactSelection => "completeShippingContactSelection",
            Pending::ShippingMethodSelection => "completeShippingMethodSelection",
            Pending::Payment => "completePayment",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Session is in state {0:?}, expected {1:?}")]
    InvalidState(SessionState, SessionState),
    #[error("Session has already ended ({0:?})")]
    Ended(SessionState),
    #[error("Event {event} received while {pending} is still unanswered")]
    Unanswered {
        event: &'static str,
        pending: Pending,
    },
    #[error("Event {event} is not expected in state {state:?}")]
    UnexpectedEvent {
        event: &'static str,
        state: SessionState,
    },
    #[error("{answer} does not answer the pending callback ({pending:?})")]
    MismatchedCompletion {
        answer: Pending,
        pending: Option<Pending>,
    },
}

/// Tracks the lifecycle of one native session.
///
/// `Created → Begun → MerchantValidated → Completed | Aborted`. Selection
/// and authorization events happen in `MerchantValidated`; a payment
/// completed with anything but [`StatusCode::Success`] lets the user retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLifecycle {
    state: SessionState,
    pending: Option<Pending>,
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLifecycle {
    pub fn new() -> Self {
        Self {
            state: SessionState::Created,
            pending: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub fn begin(&mut self) -> Result<(), LifecycleError> {
        if self.state != SessionState::Created {
            return Err(LifecycleError::InvalidState(
                self.state,
                SessionState::Created,
            ));
        }
        self.state = SessionState::Begun;
        Ok(())
    }

    /// Records an incoming event. Returns the callback it expects, if any.
    pub fn on_event(&mut self, event: &SessionEvent) -> Result<Option<Pending>, LifecycleError> {
        if self.state.is_terminal() {
            return Err(LifecycleError::Ended(self.state));
        }
        let name = event.callback_name();
        let (required, expects) = match event {
            SessionEvent::Cancel => {
                self.state = SessionState::Aborted;
                self.pending = None;
                return Ok(None);
            }
            SessionEvent::ValidateMerchant { .. } => {
                (SessionState::Begun, Pending::MerchantValidation)
            }
            SessionEvent::PaymentMethodSelected { .. } => (
                SessionState::MerchantValidated,
                Pending::PaymentMethodSelection,
            ),
            SessionEvent::ShippingContactSelected { .. } => (
                SessionState::MerchantValidated,
                Pending::ShippingContactSelection,
            ),
            SessionEvent::ShippingMethodSelected { .. } => (
                SessionState::MerchantValidated,
                Pending::ShippingMethodSelection,
            ),
            SessionEvent::PaymentAuthorized { .. } => {
                (SessionState::MerchantValidated, Pending::Payment)
            }
        };
        if let Some(pending) = self.pending {
            return Err(LifecycleError::Unanswered {
                event: name,
                pending,
            });
        }
        if self.state != required {
            return Err(LifecycleError::UnexpectedEvent {
                event: name,
                state: self.state,
            });
        }
        self.pending = Some(expects);
        Ok(Some(expects))
    }

    /// Records a `complete_*` answer.
    ///
    /// `status` only matters for [`Pending::Payment`].
    pub fn complete(&mut self, answer: Pending, status: StatusCode) -> Result<(), LifecycleError> {
        if self.state.is_terminal() {
            return Err(LifecycleError::Ended(self.state));
        }
        if self.pending != Some(answer) {
            return Err(LifecycleError::MismatchedCompletion {
                answer,
                pending: self.pending,
            });
        }
        self.pending = None;
        match answer {
            Pending::MerchantValidation => self.state = SessionState::MerchantValidated,
            Pending::Payment if status.is_success() => self.state = SessionState::Completed,
            _ => {}
        }
        Ok(())
    }

    pub fn abort(&mut self) -> Result<(), LifecycleError> {
        if self.state.is_terminal() {
            return Err(LifecycleError::Ended(self.state));
        }
        self.state = SessionState::Aborted;
        self.pending = None;
        Ok(())
    }
}

/// Answers for the selection callbacks, supplied by the merchant integration.
pub trait SelectionHandler {
    fn payment_method_selected(&mut self, payment_method: &PaymentMethod) -> PaymentMethodUpdate;

    fn shipping_contact_selected(&mut self, contact: &PaymentContact) -> ShippingContactUpdate;

    fn shipping_method_selected(&mut self, method: &ShippingMethod) -> ShippingMethodUpdate;
}

/// What a handled event led to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    MerchantValidated,
    SelectionAnswered,
    /// The payment was tokenized and the session completed with success.
    Authorized(TokenizedPayload),
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Apple Pay JS version {0} is not supported by the runtime")]
    UnsupportedVersion(u32),
    #[error("The runtime cannot make Apple Pay payments")]
    PaymentsUnavailable,
    #[error("No active card provisioned for merchant {0}")]
    NoActiveCard(String),
    #[error("Failed to create the native session: {0}")]
    Runtime(#[source] BoxError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// The session was aborted, or its payment completed with failure.
    #[error(transparent)]
    ApplePay(#[from] ApplePayError),
}

/// Drives a [`PaymentSession`] with an [`ApplePay`] component.
pub struct SessionDriver<S, G, H> {
    session: S,
    apple_pay: ApplePay<G>,
    selection: H,
    lifecycle: SessionLifecycle,
    display_name: Option<String>,
}

impl<S, G, H> SessionDriver<S, G, H>
where
    S: PaymentSession,
    G: Gateway + Send + Sync + 'static,
    H: SelectionHandler,
{
    pub fn new(session: S, apple_pay: ApplePay<G>, selection: H) -> Self {
        Self {
            session,
            apple_pay,
            selection,
            lifecycle: SessionLifecycle::new(),
            display_name: None,
        }
    }

    /// Creates a native session through `runtime` and begins it.
    ///
    /// Checks `version` support, payment availability and an active card for
    /// [`ApplePay::merchant_identifier`] before the session is created.
    pub fn start<R>(
        runtime: &R,
        version: u32,
        request: &PaymentRequest,
        apple_pay: ApplePay<G>,
        selection: H,
    ) -> Result<Self, SessionError>
    where
        R: NativeRuntime<Session = S>,
    {
        if !runtime.supports_version(version) {
            return Err(SessionError::UnsupportedVersion(version));
        }
        if !runtime.can_make_payments() {
            return Err(SessionError::PaymentsUnavailable);
        }
        let merchant_identifier = apple_pay.merchant_identifier();
        if !runtime.can_make_payments_with_active_card(merchant_identifier) {
            return Err(SessionError::NoActiveCard(merchant_identifier.to_string()));
        }
        let session = runtime
            .create_session(version, request)
            .map_err(|e| SessionError::Runtime(Box::new(e)))?;
        let mut driver = Self::new(session, apple_pay, selection);
        driver.begin()?;
        Ok(driver)
    }

    /// Display name sent with merchant validation.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn lifecycle(&self) -> &SessionLifecycle {
        &self.lifecycle
    }

    pub fn into_session(self) -> S {
        self.session
    }

    pub fn begin(&mut self) -> Result<(), SessionError> {
        self.lifecycle.begin()?;
        self.session.begin();
        Ok(())
    }

    /// Aborts the native session.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        self.lifecycle.abort()?;
        self.session.abort();
        Ok(())
    }

    /// Handles one native callback and answers it.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<SessionOutcome, SessionError> {
        self.lifecycle.on_event(&event)?;
        #[cfg(feature = "telemetry")]
        tracing::debug!(callback = event.callback_name(), "applepay.session.event");

        match event {
            SessionEvent::ValidateMerchant { validation_url } => {
                let mut options = ValidationOptions::new(validation_url);
                options.display_name = self.display_name.clone();
                match self.apple_pay.perform_validation(options).await {
                    Ok(merchant_session) => {
                        self.lifecycle
                            .complete(Pending::MerchantValidation, StatusCode::Success)?;
                        self.session.complete_merchant_validation(&merchant_session);
                        Ok(SessionOutcome::MerchantValidated)
                    }
                    Err(err) => {
                        #[cfg(feature = "telemetry")]
                        tracing::warn!(error = %err, "applepay.session.merchant_validation_failed");
                        self.lifecycle.abort()?;
                        self.session.abort();
                        Err(err.into())
                    }
                }
            }
            SessionEvent::PaymentAuthorized { payment } => {
                let options = TokenizeOptions {
                    token: payment.token,
                };
                match self.apple_pay.tokenize(options).await {
                    Ok(payload) => {
                        self.lifecycle
                            .complete(Pending::Payment, StatusCode::Success)?;
                        self.session.complete_payment(StatusCode::Success);
                        Ok(SessionOutcome::Authorized(payload))
                    }
                    Err(err) => {
                        #[cfg(feature = "telemetry")]
                        tracing::warn!(error = %err, "applepay.session.tokenization_failed");
                        self.lifecycle
                            .complete(Pending::Payment, StatusCode::Failure)?;
                        self.session.complete_payment(StatusCode::Failure);
                        Err(err.into())
                    }
                }
            }
            SessionEvent::PaymentMethodSelected { payment_method } => {
                let update = self.selection.payment_method_selected(&payment_method);
                self.lifecycle
                    .complete(Pending::PaymentMethodSelection, StatusCode::Success)?;
                self.session.complete_payment_method_selection(&update);
                Ok(SessionOutcome::SelectionAnswered)
            }
            SessionEvent::ShippingContactSelected { shipping_contact } => {
                let update = self.selection.shipping_contact_selected(&shipping_contact);
                self.lifecycle
                    .complete(Pending::ShippingContactSelection, update.status)?;
                self.session.complete_shipping_contact_selection(&update);
                Ok(SessionOutcome::SelectionAnswered)
            }
            SessionEvent::ShippingMethodSelected { shipping_method } => {
                let update = self.selection.shipping_method_selected(&shipping_method);
                self.lifecycle
                    .complete(Pending::ShippingMethodSelection, update.status)?;
                self.session.complete_shipping_method_selection(&update);
                Ok(SessionOutcome::SelectionAnswered)
            }
            SessionEvent::Cancel => Ok(SessionOutcome::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use applepay_types::config::{ApplePayWebConfiguration, GatewayConfiguration};
    use applepay_types::proto::gateway::{
        MerchantSessionRequest, TokenizeRequest, TokenizeResponse,
    };
    use applepay_types::proto::{LineItem, PartialPaymentRequest, Payment, PaymentToken};
    use serde_json::json;
    use std::cell::RefCell;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("fake gateway refused: {0}")]
    struct FakeRefusal(&'static str);

    impl GatewayError for FakeRefusal {
        fn is_rejection(&self) -> bool {
            true
        }
    }

    /// In-memory gateway that accepts or refuses everything.
    #[derive(Debug, Default)]
    struct FakeGateway {
        refuse: bool,
        calls: Mutex<Vec<&'static str>>,
    }

    impl Gateway for FakeGateway {
        type Error = FakeRefusal;

        async fn configuration(&self) -> Result<GatewayConfiguration, FakeRefusal> {
            Ok(GatewayConfiguration::default())
        }

        async fn create_merchant_session(
            &self,
            request: &MerchantSessionRequest,
        ) -> Result<ValidationPayload, FakeRefusal> {
            self.calls.lock().unwrap().push("merchant_session");
            if self.refuse {
                return Err(FakeRefusal("merchant session"));
            }
            Ok(ValidationPayload(json!({
                "merchantIdentifier": request.apple_pay_web_session.merchant_identifier,
                "displayName": request.apple_pay_web_session.display_name,
            })))
        }

        async fn tokenize_apple_payment_token(
            &self,
            _request: &TokenizeRequest,
        ) -> Result<TokenizeResponse, FakeRefusal> {
            self.calls.lock().unwrap().push("tokenize");
            if self.refuse {
                return Err(FakeRefusal("tokenize"));
            }
            Ok(serde_json::from_value(json!({
                "applePayCards": [{"nonce": "nonce-1", "type": "ApplePayCard"}]
            }))
            .unwrap())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Begin,
        Abort,
        MerchantValidation(serde_json::Value),
        Payment(StatusCode),
        PaymentMethod(String),
        ShippingContact(StatusCode),
        ShippingMethod(StatusCode),
    }

    #[derive(Debug, Default)]
    struct RecordingSession {
        calls: Vec<Call>,
    }

    impl PaymentSession for RecordingSession {
        fn begin(&mut self) {
            self.calls.push(Call::Begin);
        }

        fn abort(&mut self) {
            self.calls.push(Call::Abort);
        }

        fn complete_merchant_validation(&mut self, merchant_session: &ValidationPayload) {
            self.calls
                .push(Call::MerchantValidation(merchant_session.as_value().clone()));
        }

        fn complete_payment(&mut self, status: StatusCode) {
            self.calls.push(Call::Payment(status));
        }

        fn complete_payment_method_selection(&mut self, update: &PaymentMethodUpdate) {
            self.calls
                .push(Call::PaymentMethod(update.new_total.amount.clone()));
        }

        fn complete_shipping_contact_selection(&mut self, update: &ShippingContactUpdate) {
            self.calls.push(Call::ShippingContact(update.status));
        }

        fn complete_shipping_method_selection(&mut self, update: &ShippingMethodUpdate) {
            self.calls.push(Call::ShippingMethod(update.status));
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("session refused by the runtime")]
    struct SheetBusy;

    /// Runtime that supports versions up to `max_version`.
    #[derive(Debug, Default)]
    struct FakeRuntime {
        max_version: u32,
        card_for: Option<&'static str>,
        busy: bool,
        created: RefCell<Vec<(u32, PaymentRequest)>>,
    }

    impl NativeRuntime for FakeRuntime {
        type Session = RecordingSession;
        type Error = SheetBusy;

        fn supports_version(&self, version: u32) -> bool {
            version <= self.max_version
        }

        fn can_make_payments(&self) -> bool {
            true
        }

        fn can_make_payments_with_active_card(&self, merchant_identifier: &str) -> bool {
            self.card_for == Some(merchant_identifier)
        }

        fn create_session(
            &self,
            version: u32,
            request: &PaymentRequest,
        ) -> Result<RecordingSession, SheetBusy> {
            if self.busy {
                return Err(SheetBusy);
            }
            self.created.borrow_mut().push((version, request.clone()));
            Ok(RecordingSession::default())
        }
    }

    fn runtime() -> FakeRuntime {
        FakeRuntime {
            max_version: 3,
            card_for: Some("merchant.com.example"),
            ..Default::default()
        }
    }

    /// Adds a surcharge for credit cards and refuses shipping outside the US.
    struct Shop;

    impl SelectionHandler for Shop {
        fn payment_method_selected(&mut self, payment_method: &PaymentMethod) -> PaymentMethodUpdate {
            let amount = match payment_method.kind {
                Some(applepay_types::proto::PaymentMethodType::Credit) => "20.99",
                _ => "19.99",
            };
            PaymentMethodUpdate {
                new_total: LineItem::new("Co", amount),
                new_line_items: None,
            }
        }

        fn shipping_contact_selected(&mut self, contact: &PaymentContact) -> ShippingContactUpdate {
            let status = if contact.country_code.as_deref() == Some("US") {
                StatusCode::Success
            } else {
                StatusCode::InvalidShippingPostalAddress
            };
            ShippingContactUpdate {
                status,
                new_shipping_methods: vec![],
                new_total: LineItem::new("Co", "19.99"),
                new_line_items: None,
            }
        }

        fn shipping_method_selected(&mut self, _method: &ShippingMethod) -> ShippingMethodUpdate {
            ShippingMethodUpdate {
                status: StatusCode::Success,
                new_total: LineItem::new("Co", "24.99"),
                new_line_items: None,
            }
        }
    }

    fn apple_pay(refuse: bool) -> ApplePay<FakeGateway> {
        ApplePay::from_configuration(
            FakeGateway {
                refuse,
                ..Default::default()
            },
            ApplePayWebConfiguration {
                country_code: "US".into(),
                currency_code: "USD".into(),
                merchant_identifier: "merchant.com.example".into(),
                supported_networks: vec!["visa".into()],
                merchant_capabilities: None,
            },
        )
    }

    fn validate() -> SessionEvent {
        SessionEvent::ValidateMerchant {
            validation_url: "https://apple.example/startSession".into(),
        }
    }

    fn authorized() -> SessionEvent {
        let token: PaymentToken =
            serde_json::from_value(json!({"paymentData": {"data": "x"}})).unwrap();
        SessionEvent::PaymentAuthorized {
            payment: Payment {
                token,
                billing_contact: None,
                shipping_contact: None,
            },
        }
    }

    fn shipping_contact(country_code: &str) -> SessionEvent {
        SessionEvent::ShippingContactSelected {
            shipping_contact: PaymentContact {
                country_code: Some(country_code.into()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.begin().unwrap();
        assert_eq!(
            lifecycle.on_event(&validate()).unwrap(),
            Some(Pending::MerchantValidation)
        );
        lifecycle
            .complete(Pending::MerchantValidation, StatusCode::Success)
            .unwrap();
        assert_eq!(lifecycle.state(), SessionState::MerchantValidated);
        lifecycle.on_event(&authorized()).unwrap();
        lifecycle
            .complete(Pending::Payment, StatusCode::Success)
            .unwrap();
        assert_eq!(lifecycle.state(), SessionState::Completed);
        assert!(matches!(
            lifecycle.on_event(&authorized()),
            Err(LifecycleError::Ended(SessionState::Completed))
        ));
    }

    #[test]
    fn test_lifecycle_requires_begin_and_validation() {
        let mut lifecycle = SessionLifecycle::new();
        assert!(matches!(
            lifecycle.on_event(&validate()),
            Err(LifecycleError::UnexpectedEvent { .. })
        ));
        lifecycle.begin().unwrap();
        assert!(matches!(
            lifecycle.begin(),
            Err(LifecycleError::InvalidState(SessionState::Begun, SessionState::Created))
        ));
        assert!(matches!(
            lifecycle.on_event(&authorized()),
            Err(LifecycleError::UnexpectedEvent {
                event: "onpaymentauthorized",
                state: SessionState::Begun
            })
        ));
    }

    #[test]
    fn test_lifecycle_rejects_unanswered_and_mismatched() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.begin().unwrap();
        lifecycle.on_event(&validate()).unwrap();
        assert!(matches!(
            lifecycle.on_event(&validate()),
            Err(LifecycleError::Unanswered {
                pending: Pending::MerchantValidation,
                ..
            })
        ));
        assert!(matches!(
            lifecycle.complete(Pending::Payment, StatusCode::Success),
            Err(LifecycleError::MismatchedCompletion { .. })
        ));
    }

    #[test]
    fn test_lifecycle_failed_payment_allows_retry() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.begin().unwrap();
        lifecycle.on_event(&validate()).unwrap();
        lifecycle
            .complete(Pending::MerchantValidation, StatusCode::Success)
            .unwrap();
        lifecycle.on_event(&authorized()).unwrap();
        lifecycle
            .complete(Pending::Payment, StatusCode::PinRequired)
            .unwrap();
        assert_eq!(lifecycle.state(), SessionState::MerchantValidated);
        assert_eq!(lifecycle.on_event(&authorized()).unwrap(), Some(Pending::Payment));
    }

    #[test]
    fn test_lifecycle_cancel_is_terminal() {
        let mut lifecycle = SessionLifecycle::new();
        lifecycle.begin().unwrap();
        lifecycle.on_event(&validate()).unwrap();
        lifecycle.on_event(&SessionEvent::Cancel).unwrap();
        assert_eq!(lifecycle.state(), SessionState::Aborted);
        assert_eq!(lifecycle.pending(), None);
        assert!(lifecycle.abort().is_err());
    }

    #[tokio::test]
    async fn test_driver_full_payment() {
        let mut driver = SessionDriver::new(RecordingSession::default(), apple_pay(false), Shop)
            .with_display_name("My Store");
        driver.begin().unwrap();
        assert_eq!(
            driver.handle(validate()).await.unwrap(),
            SessionOutcome::MerchantValidated
        );
        driver
            .handle(SessionEvent::PaymentMethodSelected {
                payment_method: serde_json::from_value(json!({"type": "credit"})).unwrap(),
            })
            .await
            .unwrap();
        driver.handle(shipping_contact("US")).await.unwrap();
        let outcome = driver.handle(authorized()).await.unwrap();
        match outcome {
            SessionOutcome::Authorized(payload) => assert_eq!(payload.nonce, "nonce-1"),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(driver.lifecycle().state(), SessionState::Completed);
        assert_eq!(
            driver.session().calls,
            vec![
                Call::Begin,
                Call::MerchantValidation(json!({
                    "merchantIdentifier": "merchant.com.example",
                    "displayName": "My Store"
                })),
                Call::PaymentMethod("20.99".into()),
                Call::ShippingContact(StatusCode::Success),
                Call::Payment(StatusCode::Success),
            ]
        );
    }

    #[tokio::test]
    async fn test_driver_aborts_on_validation_failure() {
        let mut driver = SessionDriver::new(RecordingSession::default(), apple_pay(true), Shop);
        driver.begin().unwrap();
        let err = driver.handle(validate()).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::ApplePay(ApplePayError::MerchantValidationFailed { .. })
        ));
        assert_eq!(driver.lifecycle().state(), SessionState::Aborted);
        assert_eq!(driver.session().calls, vec![Call::Begin, Call::Abort]);
    }

    #[tokio::test]
    async fn test_driver_fails_payment_on_tokenization_error() {
        let apple_pay = apple_pay(true);
        let mut driver = SessionDriver::new(RecordingSession::default(), apple_pay, Shop);
        driver.begin().unwrap();
        // Validation would be refused too, so mark it answered.
        driver.lifecycle.on_event(&validate()).unwrap();
        driver
            .lifecycle
            .complete(Pending::MerchantValidation, StatusCode::Success)
            .unwrap();

        let err = driver.handle(authorized()).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::ApplePay(ApplePayError::Tokenization { .. })
        ));
        assert_eq!(
            driver.session().calls.last(),
            Some(&Call::Payment(StatusCode::Failure))
        );
        assert_eq!(
            driver.lifecycle().state(),
            SessionState::MerchantValidated
        );
    }

    #[tokio::test]
    async fn test_driver_rejects_out_of_order_events() {
        let mut driver = SessionDriver::new(RecordingSession::default(), apple_pay(false), Shop);
        driver.begin().unwrap();
        let err = driver.handle(authorized()).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Lifecycle(LifecycleError::UnexpectedEvent { .. })
        ));
        assert!(driver.apple_pay.gateway().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_driver_invalid_shipping_contact() {
        let mut driver = SessionDriver::new(RecordingSession::default(), apple_pay(false), Shop);
        driver.begin().unwrap();
        driver.handle(validate()).await.unwrap();
        driver.handle(shipping_contact("FR")).await.unwrap();
        assert_eq!(
            driver.session().calls.last(),
            Some(&Call::ShippingContact(
                StatusCode::InvalidShippingPostalAddress
            ))
        );
        assert_eq!(driver.handle(SessionEvent::Cancel).await.unwrap(), SessionOutcome::Cancelled);
        assert_eq!(driver.lifecycle().state(), SessionState::Aborted);
    }

    #[tokio::test]
    async fn test_start_creates_and_begins_session() {
        let runtime = runtime();
        let apple_pay = apple_pay(false);
        let request = apple_pay
            .create_payment_request(PartialPaymentRequest::new(LineItem::new("Co", "19.99")));

        let mut driver = SessionDriver::start(&runtime, 3, &request, apple_pay, Shop).unwrap();
        assert_eq!(driver.lifecycle().state(), SessionState::Begun);
        assert_eq!(driver.session().calls, vec![Call::Begin]);
        let created = runtime.created.borrow();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, 3);
        assert_eq!(created[0].1.country_code, "US");
        drop(created);

        assert_eq!(
            driver.handle(validate()).await.unwrap(),
            SessionOutcome::MerchantValidated
        );
    }

    #[test]
    fn test_start_rejects_unsupported_version() {
        let runtime = runtime();
        let apple_pay = apple_pay(false);
        let request = apple_pay
            .create_payment_request(PartialPaymentRequest::new(LineItem::new("Co", "19.99")));

        let result = SessionDriver::start(&runtime, 14, &request, apple_pay, Shop);
        assert!(matches!(result, Err(SessionError::UnsupportedVersion(14))));
        assert!(runtime.created.borrow().is_empty());
    }

    #[test]
    fn test_start_requires_active_card_for_merchant() {
        let runtime = FakeRuntime {
            card_for: Some("merchant.com.other"),
            ..runtime()
        };
        let apple_pay = apple_pay(false);
        let request = apple_pay
            .create_payment_request(PartialPaymentRequest::new(LineItem::new("Co", "19.99")));

        let result = SessionDriver::start(&runtime, 3, &request, apple_pay, Shop);
        assert!(matches!(
            result,
            Err(SessionError::NoActiveCard(ref id)) if id == "merchant.com.example"
        ));
        assert!(runtime.created.borrow().is_empty());
    }

    #[test]
    fn test_start_reports_runtime_failure() {
        let runtime = FakeRuntime {
            busy: true,
            ..runtime()
        };
        let apple_pay = apple_pay(false);
        let request = apple_pay
            .create_payment_request(PartialPaymentRequest::new(LineItem::new("Co", "19.99")));

        let result = SessionDriver::start(&runtime, 3, &request, apple_pay, Shop);
        match result {
            Err(err @ SessionError::Runtime(_)) => {
                assert_eq!(
                    err.to_string(),
                    "Failed to create the native session: session refused by the runtime"
                );
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("session should not start"),
        }
    }
}
