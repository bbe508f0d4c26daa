use super::booking::BookingParams;
use super::payment::{PaymentOutcome, PaymentReference, SettlementStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Issues a signed payment request for a booking.
#[async_trait]
pub trait PaymentReferenceService: Send + Sync {
    async fn get_reference(&self, booking: &BookingParams) -> Result<PaymentReference>;
}

/// Answers with the settlement status of a merchant transaction.
#[async_trait]
pub trait PaymentStatusService: Send + Sync {
    async fn get_status(
        &self,
        merchant_transaction_id: &str,
        booking: &BookingParams,
    ) -> Result<SettlementStatus>;
}

/// A callback-driven payment experience.
///
/// `start_payment` returns immediately. The gateway later reports the result
/// through `on_result`, possibly from a thread of its own. Completion is
/// expected exactly once, but the callback tolerates being fired again.
pub trait PaymentGateway: Send + Sync {
    fn start_payment(
        &self,
        payload_base64: &str,
        checksum: &str,
        api_endpoint: &str,
        on_result: PaymentResultCallback,
    );

    /// Asks the gateway to close its payment experience.
    ///
    /// Returns `false` when the gateway cannot be dismissed from outside.
    fn dismiss(&self) -> bool {
        false
    }
}

pub type SharedReferenceService = Arc<dyn PaymentReferenceService>;
pub type SharedStatusService = Arc<dyn PaymentStatusService>;
pub type SharedGateway = Arc<dyn PaymentGateway>;

/// Single-assignment completion slot handed to a [`PaymentGateway`].
///
/// Clones share the slot. The first `complete` wins; later calls are
/// ignored and logged as a protocol violation.
#[derive(Clone)]
pub struct PaymentResultCallback {
    merchant_transaction_id: Arc<str>,
    slot: Arc<Mutex<Option<oneshot::Sender<PaymentOutcome>>>>,
}

impl PaymentResultCallback {
    /// Creates a callback and the receiver its first completion resolves.
    pub fn new(merchant_transaction_id: &str) -> (Self, oneshot::Receiver<PaymentOutcome>) {
        let (tx, rx) = oneshot::channel();
        let callback = Self {
            merchant_transaction_id: Arc::from(merchant_transaction_id),
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (callback, rx)
    }

    /// Delivers the outcome. Returns `true` only for the completion that
    /// actually reached a waiting flow.
    pub fn complete(&self, outcome: PaymentOutcome) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(tx) => {
                let delivered = tx.send(outcome).is_ok();
                if !delivered {
                    debug!(
                        merchant_transaction_id = %self.merchant_transaction_id,
                        "gateway result arrived after the flow was abandoned"
                    );
                }
                delivered
            }
            None => {
                warn!(
                    merchant_transaction_id = %self.merchant_transaction_id,
                    ?outcome,
                    "duplicate gateway callback ignored"
                );
                false
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn merchant_transaction_id(&self) -> &str {
        &self.merchant_transaction_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_completion_wins() {
        let (callback, rx) = PaymentResultCallback::new("T1");
        let duplicate = callback.clone();

        assert!(callback.complete(PaymentOutcome::Success));
        assert!(!duplicate.complete(PaymentOutcome::Cancelled));
        assert!(callback.is_completed());

        assert_eq!(rx.await.unwrap(), PaymentOutcome::Success);
    }

    #[test]
    fn test_completion_from_another_thread() {
        let (callback, rx) = PaymentResultCallback::new("T2");
        let handle = std::thread::spawn(move || callback.complete(PaymentOutcome::Cancelled));

        assert!(handle.join().unwrap());
        assert_eq!(rx.blocking_recv().unwrap(), PaymentOutcome::Cancelled);
    }

    #[test]
    fn test_completion_after_receiver_dropped() {
        let (callback, rx) = PaymentResultCallback::new("T3");
        drop(rx);
        assert!(!callback.complete(PaymentOutcome::Success));
        assert!(callback.is_completed());
    }
}
