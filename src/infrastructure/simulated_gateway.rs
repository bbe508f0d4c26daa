use crate::domain::payment::PaymentOutcome;
use crate::domain::ports::{PaymentGateway, PaymentResultCallback};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// What the simulated payment experience ends with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayScript {
    Success,
    Failure(String),
    Cancelled,
}

impl From<&GatewayScript> for PaymentOutcome {
    fn from(script: &GatewayScript) -> Self {
        match script {
            GatewayScript::Success => PaymentOutcome::Success,
            GatewayScript::Failure(message) => PaymentOutcome::Failure(message.clone()),
            GatewayScript::Cancelled => PaymentOutcome::Cancelled,
        }
    }
}

/// A payment gateway that reports a scripted outcome from its own thread.
///
/// Mirrors an embedded SDK: the result arrives on a thread the caller does
/// not control, after `delay`. A dismissable gateway reports `Cancelled`
/// as soon as it is dismissed.
#[derive(Clone)]
pub struct SimulatedGateway {
    script: GatewayScript,
    delay: Duration,
    dismissable: bool,
    pending: Arc<Mutex<Option<PaymentResultCallback>>>,
}

impl SimulatedGateway {
    pub fn new(script: GatewayScript) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            dismissable: false,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn dismissable(mut self, dismissable: bool) -> Self {
        self.dismissable = dismissable;
        self
    }
}

impl PaymentGateway for SimulatedGateway {
    fn start_payment(
        &self,
        payload_base64: &str,
        _checksum: &str,
        api_endpoint: &str,
        on_result: PaymentResultCallback,
    ) {
        debug!(
            merchant_transaction_id = on_result.merchant_transaction_id(),
            api_endpoint,
            payload_len = payload_base64.len(),
            "opening simulated payment page"
        );
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(on_result.clone());

        let outcome = PaymentOutcome::from(&self.script);
        let delay = self.delay;
        thread::spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            on_result.complete(outcome);
        });
    }

    fn dismiss(&self) -> bool {
        if !self.dismissable {
            return false;
        }
        if let Some(callback) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            callback.complete(PaymentOutcome::Cancelled);
        }
        true
    }
}
