use crate::domain::booking::BookingParams;
use crate::domain::payment::{PaymentReference, SettlementStatus};
use crate::domain::ports::{PaymentReferenceService, PaymentStatusService};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const REFERENCE_ACTION: &str = "payment_api_payPage";
const STATUS_ACTION: &str = "new_payment_status";
const PENDING_CODE: &str = "PAYMENT_PENDING";

/// The hospital backend reached over HTTP.
///
/// Both services POST a form-encoded body to the same endpoint and select
/// the operation through the `action` field.
#[derive(Clone)]
pub struct HttpPaymentBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpPaymentBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    async fn post(&self, form: &[(&'static str, String)]) -> Result<String> {
        let body = self
            .client
            .post(&self.endpoint)
            .form(form)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl PaymentReferenceService for HttpPaymentBackend {
    async fn get_reference(&self, booking: &BookingParams) -> Result<PaymentReference> {
        debug!(order_id = %booking.order_id, "requesting payment reference");
        let body = self.post(&reference_form(booking)).await?;
        decode_reference(&body)
    }
}

#[async_trait]
impl PaymentStatusService for HttpPaymentBackend {
    async fn get_status(
        &self,
        merchant_transaction_id: &str,
        booking: &BookingParams,
    ) -> Result<SettlementStatus> {
        debug!(merchant_transaction_id, "requesting payment status");
        let body = self
            .post(&status_form(merchant_transaction_id, booking))
            .await?;
        decode_status(&body)
    }
}

fn reference_form(booking: &BookingParams) -> Vec<(&'static str, String)> {
    vec![
        ("action", REFERENCE_ACTION.to_string()),
        ("mobile_no", booking.mobile.clone()),
        ("amount", booking.amount.to_string()),
        ("p_id", booking.patient_id.clone()),
        ("name", booking.patient_name.clone()),
        ("doc_name", booking.doctor_name.clone()),
        ("doc_id", booking.doctor_id.clone()),
        ("doc_time_from", booking.slot_start.clone()),
        ("duration_per_patient", booking.duration.to_string()),
        ("opd_type", booking.opd_type.clone()),
        ("order_id", booking.order_id.clone()),
    ]
}

fn status_form(merchant_transaction_id: &str, booking: &BookingParams) -> Vec<(&'static str, String)> {
    vec![
        ("action", STATUS_ACTION.to_string()),
        ("merchantTransactionId", merchant_transaction_id.to_string()),
        ("doc_name", booking.doctor_name.clone()),
        ("doc_id", booking.doctor_id.clone()),
        ("doc_time_from", booking.slot_start.clone()),
        ("duration_per_patient", booking.duration.to_string()),
        ("opd_type", booking.opd_type.clone()),
        ("order_id", booking.order_id.clone()),
    ]
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceBody {
    #[serde(default)]
    merchant_transaction_id: String,
    #[serde(default)]
    payload_base64: String,
    #[serde(default)]
    checksum: String,
    #[serde(default)]
    api_endpoint: String,
}

/// Scalars the backend sends either as JSON numbers/booleans or as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl Loose {
    fn is_set(&self) -> bool {
        match self {
            Loose::Flag(flag) => *flag,
            Loose::Number(n) => *n == 1,
            Loose::Text(text) => matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "true" | "success" | "1"
            ),
        }
    }

    fn into_text(self) -> String {
        match self {
            Loose::Flag(flag) => flag.to_string(),
            Loose::Number(n) => n.to_string(),
            Loose::Text(text) => text,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    response: Loose,
    #[serde(default)]
    message_code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    transaction_id: String,
    opd_id: Option<Loose>,
    token_number: Option<Loose>,
    registration_date: Option<String>,
    estimated_time: Option<String>,
}

fn decode_reference(body: &str) -> Result<PaymentReference> {
    let wire: ReferenceBody = serde_json::from_str(body)?;
    if wire.merchant_transaction_id.trim().is_empty() || wire.payload_base64.trim().is_empty() {
        return Err(PaymentError::ServerError("empty payment reference".to_string()));
    }
    Ok(PaymentReference {
        merchant_transaction_id: wire.merchant_transaction_id,
        payload_base64: wire.payload_base64,
        checksum: wire.checksum,
        api_endpoint: wire.api_endpoint,
    })
}

fn decode_status(body: &str) -> Result<SettlementStatus> {
    let wire: StatusBody = serde_json::from_str(body)?;
    let is_success = wire.response.is_set();
    let is_pending = !is_success && wire.message_code == PENDING_CODE;

    Ok(SettlementStatus {
        is_success,
        is_pending,
        message_code: wire.message_code,
        message: wire.message,
        transaction_id: wire.transaction_id,
        booking_id: wire.opd_id.map(Loose::into_text),
        token_number: wire.token_number.map(Loose::into_text),
        scheduled_date: wire.registration_date,
        estimated_time: wire.estimated_time,
    })
}
