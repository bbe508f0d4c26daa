use crate::domain::booking::BookingParams;
use crate::domain::payment::{PaymentReference, SettlementStatus};
use crate::domain::ports::{PaymentReferenceService, PaymentStatusService};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// How the in-memory backend settles every payment it is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementScript {
    #[default]
    Success,
    Pending,
    Failed,
}

#[derive(Default)]
struct Ledger {
    last_id: u64,
    issued: HashMap<String, BookingParams>,
    settled: HashMap<String, SettlementStatus>,
    tokens: HashMap<String, u32>,
}

/// A thread-safe in-memory stand-in for the hospital payment backend.
///
/// Implements both the reference and the status service over one shared
/// ledger, so status lookups only succeed for references it issued. Cloning
/// shares the ledger.
#[derive(Clone, Default)]
pub struct InMemoryPaymentBackend {
    ledger: Arc<RwLock<Ledger>>,
    script: SettlementScript,
    reference_failure: Option<String>,
}

impl InMemoryPaymentBackend {
    pub fn new(script: SettlementScript) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// A backend whose reference requests all fail with `reason`.
    pub fn failing_references(reason: impl Into<String>) -> Self {
        Self {
            reference_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    pub async fn issued_count(&self) -> usize {
        self.ledger.read().await.issued.len()
    }

    pub async fn booking_for(&self, merchant_transaction_id: &str) -> Option<BookingParams> {
        self.ledger
            .read()
            .await
            .issued
            .get(merchant_transaction_id)
            .cloned()
    }
}

#[async_trait]
impl PaymentReferenceService for InMemoryPaymentBackend {
    async fn get_reference(&self, booking: &BookingParams) -> Result<PaymentReference> {
        if let Some(reason) = &self.reference_failure {
            return Err(PaymentError::ServerError(reason.clone()));
        }

        let mut ledger = self.ledger.write().await;
        ledger.last_id += 1;
        let merchant_transaction_id = format!("MT{:06}", ledger.last_id);
        ledger
            .issued
            .insert(merchant_transaction_id.clone(), booking.clone());

        Ok(PaymentReference {
            payload_base64: format!("offline:{}:{}", booking.order_id, booking.amount),
            checksum: format!("offline###{}", ledger.last_id),
            api_endpoint: "/pg/v1/pay".to_string(),
            merchant_transaction_id,
        })
    }
}

#[async_trait]
impl PaymentStatusService for InMemoryPaymentBackend {
    async fn get_status(
        &self,
        merchant_transaction_id: &str,
        booking: &BookingParams,
    ) -> Result<SettlementStatus> {
        let mut ledger = self.ledger.write().await;
        if !ledger.issued.contains_key(merchant_transaction_id) {
            return Err(PaymentError::ServerError(format!(
                "unknown merchant transaction {merchant_transaction_id}"
            )));
        }
        if let Some(status) = ledger.settled.get(merchant_transaction_id) {
            return Ok(status.clone());
        }

        let transaction_id = format!(
            "PG{}",
            merchant_transaction_id
                .strip_prefix("MT")
                .unwrap_or(merchant_transaction_id)
        );
        let status = match self.script {
            SettlementScript::Success => {
                let token = ledger.tokens.entry(booking.doctor_id.clone()).or_insert(0);
                *token += 1;
                SettlementStatus {
                    is_success: true,
                    is_pending: false,
                    message_code: "PAYMENT_SUCCESS".to_string(),
                    message: "Your payment is successful.".to_string(),
                    transaction_id,
                    booking_id: Some(format!("OPD-{}", booking.order_id)),
                    token_number: Some(token.to_string()),
                    scheduled_date: Some(booking.slot_start.clone()),
                    estimated_time: Some(format!("+{}m", (*token - 1) * booking.duration)),
                }
            }
            SettlementScript::Pending => SettlementStatus {
                is_pending: true,
                message_code: "PAYMENT_PENDING".to_string(),
                message: "Payment is pending, awaiting bank confirmation.".to_string(),
                transaction_id,
                ..SettlementStatus::default()
            },
            SettlementScript::Failed => SettlementStatus {
                message_code: "PAYMENT_ERROR".to_string(),
                message: "Payment failed.".to_string(),
                transaction_id,
                ..SettlementStatus::default()
            },
        };

        ledger
            .settled
            .insert(merchant_transaction_id.to_string(), status.clone());
        Ok(status)
    }
}
