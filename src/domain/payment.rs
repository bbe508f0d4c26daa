use super::booking::BookingParams;
use crate::error::{PaymentError, Result};
use serde::Serialize;

/// A signed payment request issued for exactly one payment attempt.
///
/// Everything except `merchant_transaction_id` is opaque and handed to the
/// gateway unmodified. A retry always asks for a fresh reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReference {
    pub merchant_transaction_id: String,
    pub payload_base64: String,
    pub checksum: String,
    pub api_endpoint: String,
}

/// What the gateway reports once the user leaves the payment experience.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Failure(String),
    Cancelled,
}

/// Booking data the hospital attaches to a settled payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub token_number: String,
    pub scheduled_date: String,
    pub estimated_time: String,
}

/// The authoritative answer of the status service for one merchant transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettlementStatus {
    pub is_success: bool,
    pub is_pending: bool,
    pub message_code: String,
    pub message: String,
    pub transaction_id: String,
    pub booking_id: Option<String>,
    pub token_number: Option<String>,
    pub scheduled_date: Option<String>,
    pub estimated_time: Option<String>,
}

/// The three-way classification of a [`SettlementStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Confirmed(BookingConfirmation),
    Pending,
    Failed,
}

impl SettlementStatus {
    /// Classifies the status, enforcing the success data contract.
    ///
    /// A success must carry every booking confirmation field; a blank value
    /// counts as missing. Success and pending together are contradictory.
    pub fn verdict(&self) -> Result<Settlement> {
        if self.is_success && self.is_pending {
            return Err(PaymentError::ContractViolationError(
                "settlement reported as both successful and pending".to_string(),
            ));
        }
        if self.is_pending {
            return Ok(Settlement::Pending);
        }
        if !self.is_success {
            return Ok(Settlement::Failed);
        }

        Ok(Settlement::Confirmed(BookingConfirmation {
            booking_id: required("bookingId", &self.booking_id)?,
            token_number: required("tokenNumber", &self.token_number)?,
            scheduled_date: required("scheduledDate", &self.scheduled_date)?,
            estimated_time: required("estimatedTime", &self.estimated_time)?,
        }))
    }
}

fn required(field: &str, value: &Option<String>) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(PaymentError::ContractViolationError(format!(
            "successful settlement is missing {field}"
        ))),
    }
}

/// Everything known about one payment attempt, accumulated stage by stage.
///
/// Booking inputs are present from the start; the merchant transaction id
/// arrives with the reference and the settlement fields with the status.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDetails {
    pub booking: BookingParams,
    pub merchant_transaction_id: Option<String>,
    pub transaction_id: Option<String>,
    pub message_code: Option<String>,
    pub message: Option<String>,
    pub confirmation: Option<BookingConfirmation>,
}

impl TransactionDetails {
    pub fn new(booking: BookingParams) -> Self {
        Self {
            booking,
            merchant_transaction_id: None,
            transaction_id: None,
            message_code: None,
            message: None,
            confirmation: None,
        }
    }

    pub(crate) fn record_reference(&mut self, reference: &PaymentReference) {
        self.merchant_transaction_id = Some(reference.merchant_transaction_id.clone());
    }

    pub(crate) fn record_settlement(&mut self, status: &SettlementStatus) {
        self.transaction_id = Some(status.transaction_id.clone());
        self.message_code = Some(status.message_code.clone());
        self.message = Some(status.message.clone());
    }

    pub(crate) fn confirm(&mut self, confirmation: BookingConfirmation) {
        self.confirmation = Some(confirmation);
    }

    pub fn token_number(&self) -> Option<&str> {
        self.confirmation.as_ref().map(|c| c.token_number.as_str())
    }
}
